use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::{ProposalError, Result};

/// The enumerated set of generation actions.
pub const ACTIONS: [&str; 5] = [
    "analyze_industry",
    "generate_technical_section",
    "generate_timeline",
    "apply_user_feedback",
    "classify",
];

/// A validated generation request, one variant per action.
///
/// Constructed either directly or from the wire form (action identifier
/// plus a JSON parameter bag) via [`GenerationRequest::from_parts`], which
/// rejects unknown actions and absent-or-empty required parameters before
/// any routine runs. Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationRequest {
    AnalyzeIndustry {
        extracted_text: String,
    },
    GenerateTechnicalSection {
        client_text: String,
        extracted_text: String,
        project_requirements: Option<String>,
        /// When set, the routine also reports the client classification
        /// alongside the drafted section.
        include_classification: bool,
    },
    GenerateTimeline {
        client_text: String,
        relevant_text: String,
        additional_context: Option<String>,
    },
    ApplyUserFeedback {
        current_draft: String,
        user_feedback: String,
    },
    Classify {
        client_text: String,
    },
}

impl GenerationRequest {
    pub fn action(&self) -> &'static str {
        match self {
            GenerationRequest::AnalyzeIndustry { .. } => "analyze_industry",
            GenerationRequest::GenerateTechnicalSection { .. } => "generate_technical_section",
            GenerationRequest::GenerateTimeline { .. } => "generate_timeline",
            GenerationRequest::ApplyUserFeedback { .. } => "apply_user_feedback",
            GenerationRequest::Classify { .. } => "classify",
        }
    }

    /// Build a request from an action identifier and a parameter bag.
    pub fn from_parts(action: &str, params: &Map<String, Value>) -> Result<Self> {
        match action {
            "analyze_industry" => Ok(GenerationRequest::AnalyzeIndustry {
                extracted_text: required(action, params, "extracted_text")?,
            }),
            "generate_technical_section" => Ok(GenerationRequest::GenerateTechnicalSection {
                client_text: required(action, params, "client_text")?,
                extracted_text: required(action, params, "extracted_text")?,
                project_requirements: optional(params, "project_requirements"),
                include_classification: flag(params, "include_classification"),
            }),
            "generate_timeline" => Ok(GenerationRequest::GenerateTimeline {
                client_text: required(action, params, "client_text")?,
                relevant_text: required(action, params, "relevant_text")?,
                additional_context: optional(params, "additional_context"),
            }),
            "apply_user_feedback" => Ok(GenerationRequest::ApplyUserFeedback {
                current_draft: required(action, params, "current_draft")?,
                user_feedback: required(action, params, "user_feedback")?,
            }),
            "classify" => Ok(GenerationRequest::Classify {
                client_text: required(action, params, "client_text")?,
            }),
            other => Err(ProposalError::InvalidAction(other.to_string())),
        }
    }
}

fn required(action: &str, params: &Map<String, Value>, key: &str) -> Result<String> {
    match params.get(key).and_then(Value::as_str) {
        Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
        _ => Err(ProposalError::MissingInput {
            action: action.to_string(),
            param: key.to_string(),
        }),
    }
}

fn optional(params: &Map<String, Value>, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

fn flag(params: &Map<String, Value>, key: &str) -> bool {
    match params.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

/// Named output fields produced by a generation routine.
///
/// Serializes as a flat object carrying exactly the declared field(s) for
/// the action, e.g. `{"timeline": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationOutput {
    TechnicalSection {
        technical_solution: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        classification: Option<String>,
    },
    IndustryAnalysis {
        industry_analysis: String,
    },
    Timeline {
        timeline: String,
    },
    RevisedDraft {
        revised_draft: String,
    },
    Classification {
        classification: String,
    },
}

impl GenerationOutput {
    pub fn technical_solution(&self) -> Option<&str> {
        match self {
            GenerationOutput::TechnicalSection {
                technical_solution, ..
            } => Some(technical_solution),
            _ => None,
        }
    }

    pub fn industry_analysis(&self) -> Option<&str> {
        match self {
            GenerationOutput::IndustryAnalysis { industry_analysis } => Some(industry_analysis),
            _ => None,
        }
    }

    pub fn timeline(&self) -> Option<&str> {
        match self {
            GenerationOutput::Timeline { timeline } => Some(timeline),
            _ => None,
        }
    }

    pub fn revised_draft(&self) -> Option<&str> {
        match self {
            GenerationOutput::RevisedDraft { revised_draft } => Some(revised_draft),
            _ => None,
        }
    }

    pub fn classification(&self) -> Option<&str> {
        match self {
            GenerationOutput::TechnicalSection { classification, .. } => classification.as_deref(),
            GenerationOutput::Classification { classification } => Some(classification),
            _ => None,
        }
    }

    /// Check that this output carries the declared, non-empty field(s) for
    /// the given request. A mismatch or empty field is a routine-contract
    /// violation.
    fn validate_for(&self, request: &GenerationRequest) -> Result<()> {
        let field = match (request, self) {
            (
                GenerationRequest::AnalyzeIndustry { .. },
                GenerationOutput::IndustryAnalysis { industry_analysis },
            ) => industry_analysis,
            (
                GenerationRequest::GenerateTechnicalSection { .. },
                GenerationOutput::TechnicalSection {
                    technical_solution, ..
                },
            ) => technical_solution,
            (GenerationRequest::GenerateTimeline { .. }, GenerationOutput::Timeline { timeline }) => {
                timeline
            }
            (
                GenerationRequest::ApplyUserFeedback { .. },
                GenerationOutput::RevisedDraft { revised_draft },
            ) => revised_draft,
            (GenerationRequest::Classify { .. }, GenerationOutput::Classification { classification }) => {
                classification
            }
            _ => {
                return Err(ProposalError::UpstreamGeneration(format!(
                    "routine for '{}' returned output for a different action",
                    request.action()
                )));
            }
        };

        if field.trim().is_empty() {
            return Err(ProposalError::UpstreamGeneration(format!(
                "routine for '{}' returned an empty output field",
                request.action()
            )));
        }
        Ok(())
    }
}

/// A content-generation routine: given structured text inputs, produce one
/// or more named text outputs.
///
/// Routines are never called with empty required fields — the dispatcher
/// validates inputs first. On success the declared output field(s) must be
/// non-empty; any internal failure is reported as a typed error.
#[async_trait]
pub trait GenerationRoutine: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput>;
}

/// The five routine slots the dispatcher routes to.
#[derive(Clone)]
pub struct RoutineSet {
    pub industry: Arc<dyn GenerationRoutine>,
    pub technical: Arc<dyn GenerationRoutine>,
    pub timeline: Arc<dyn GenerationRoutine>,
    pub feedback: Arc<dyn GenerationRoutine>,
    pub classification: Arc<dyn GenerationRoutine>,
}

pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Routes a validated request to the matching routine.
///
/// Holds no mutable state between invocations; all session state lives
/// with the caller. The routine call is the pipeline's sole blocking point
/// and is bounded by a configurable timeout. On any failure the caller's
/// stores are left untouched — the dispatcher itself never writes drafts.
#[derive(Clone)]
pub struct Dispatcher {
    routines: RoutineSet,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(routines: RoutineSet) -> Self {
        Self {
            routines,
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wire entry point: validate an (action, params) pair and dispatch.
    pub async fn dispatch_parts(
        &self,
        action: &str,
        params: &Map<String, Value>,
    ) -> Result<GenerationOutput> {
        let request = GenerationRequest::from_parts(action, params)?;
        self.dispatch(request).await
    }

    pub async fn dispatch(&self, request: GenerationRequest) -> Result<GenerationOutput> {
        let routine = match &request {
            GenerationRequest::AnalyzeIndustry { .. } => &self.routines.industry,
            GenerationRequest::GenerateTechnicalSection { .. } => &self.routines.technical,
            GenerationRequest::GenerateTimeline { .. } => &self.routines.timeline,
            GenerationRequest::ApplyUserFeedback { .. } => &self.routines.feedback,
            GenerationRequest::Classify { .. } => &self.routines.classification,
        };

        let action = request.action();
        info!(action, routine = routine.name(), "dispatching generation request");

        match tokio::time::timeout(self.timeout, routine.generate(request.clone())).await {
            Err(_) => {
                warn!(action, timeout = ?self.timeout, "generation routine timed out");
                Err(ProposalError::UpstreamGeneration(format!(
                    "action '{}' timed out after {:?}",
                    action, self.timeout
                )))
            }
            Ok(Err(error @ ProposalError::UpstreamGeneration(_))) => Err(error),
            Ok(Err(other)) => Err(ProposalError::UpstreamGeneration(other.to_string())),
            Ok(Ok(output)) => {
                output.validate_for(&request)?;
                Ok(output)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubRoutine(GenerationOutput);

    #[async_trait]
    impl GenerationRoutine for StubRoutine {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutput> {
            Ok(self.0.clone())
        }
    }

    struct SlowRoutine;

    #[async_trait]
    impl GenerationRoutine for SlowRoutine {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutput> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(GenerationOutput::Timeline {
                timeline: "late".to_string(),
            })
        }
    }

    fn stub_set() -> RoutineSet {
        RoutineSet {
            industry: Arc::new(StubRoutine(GenerationOutput::IndustryAnalysis {
                industry_analysis: "Healthcare market overview".to_string(),
            })),
            technical: Arc::new(StubRoutine(GenerationOutput::TechnicalSection {
                technical_solution: "Draft A".to_string(),
                classification: None,
            })),
            timeline: Arc::new(StubRoutine(GenerationOutput::Timeline {
                timeline: "Q1: kickoff".to_string(),
            })),
            feedback: Arc::new(StubRoutine(GenerationOutput::RevisedDraft {
                revised_draft: "Short A".to_string(),
            })),
            classification: Arc::new(StubRoutine(GenerationOutput::Classification {
                classification: "government".to_string(),
            })),
        }
    }

    fn params(pairs: &[(&str, &str)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    #[tokio::test]
    async fn timeline_dispatch_returns_the_declared_field() {
        let dispatcher = Dispatcher::new(stub_set());
        let output = dispatcher
            .dispatch_parts(
                "generate_timeline",
                &params(&[("client_text", "Acme Corp"), ("relevant_text", "Deploy by Q3")]),
            )
            .await
            .unwrap();
        assert_eq!(output.timeline(), Some("Q1: kickoff"));
        assert_eq!(serde_json::to_value(&output).unwrap(), json!({"timeline": "Q1: kickoff"}));
    }

    #[tokio::test]
    async fn empty_params_fail_with_missing_input() {
        let dispatcher = Dispatcher::new(stub_set());
        for action in ACTIONS {
            let err = dispatcher.dispatch_parts(action, &Map::new()).await.unwrap_err();
            assert!(
                matches!(err, ProposalError::MissingInput { .. }),
                "{action} should require params"
            );
        }
    }

    #[tokio::test]
    async fn whitespace_only_required_param_is_missing() {
        let dispatcher = Dispatcher::new(stub_set());
        let err = dispatcher
            .dispatch_parts("analyze_industry", &params(&[("extracted_text", "   ")]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProposalError::MissingInput { ref param, .. } if param == "extracted_text"
        ));
    }

    #[tokio::test]
    async fn unknown_action_is_invalid() {
        let dispatcher = Dispatcher::new(stub_set());
        let err = dispatcher
            .dispatch_parts("generate_pricing", &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProposalError::InvalidAction(ref a) if a == "generate_pricing"));
    }

    #[tokio::test]
    async fn slow_routine_times_out_as_upstream_error() {
        let mut set = stub_set();
        set.timeline = Arc::new(SlowRoutine);
        let dispatcher = Dispatcher::new(set).with_timeout(Duration::from_millis(10));

        let err = dispatcher
            .dispatch(GenerationRequest::GenerateTimeline {
                client_text: "Acme".to_string(),
                relevant_text: "SOW".to_string(),
                additional_context: None,
            })
            .await
            .unwrap_err();
        match err {
            ProposalError::UpstreamGeneration(cause) => assert!(cause.contains("timed out")),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mismatched_output_variant_is_a_contract_violation() {
        let mut set = stub_set();
        set.timeline = Arc::new(StubRoutine(GenerationOutput::Classification {
            classification: "government".to_string(),
        }));
        let dispatcher = Dispatcher::new(set);

        let err = dispatcher
            .dispatch(GenerationRequest::GenerateTimeline {
                client_text: "Acme".to_string(),
                relevant_text: "SOW".to_string(),
                additional_context: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProposalError::UpstreamGeneration(_)));
    }

    #[tokio::test]
    async fn empty_output_field_is_rejected() {
        let mut set = stub_set();
        set.feedback = Arc::new(StubRoutine(GenerationOutput::RevisedDraft {
            revised_draft: "  ".to_string(),
        }));
        let dispatcher = Dispatcher::new(set);

        let err = dispatcher
            .dispatch(GenerationRequest::ApplyUserFeedback {
                current_draft: "Draft".to_string(),
                user_feedback: "shorter".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProposalError::UpstreamGeneration(_)));
    }

    #[test]
    fn technical_output_serializes_classification_only_when_present() {
        let bare = GenerationOutput::TechnicalSection {
            technical_solution: "Draft".to_string(),
            classification: None,
        };
        assert_eq!(
            serde_json::to_value(&bare).unwrap(),
            json!({"technical_solution": "Draft"})
        );

        let with = GenerationOutput::TechnicalSection {
            technical_solution: "Draft".to_string(),
            classification: Some("government".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&with).unwrap(),
            json!({"technical_solution": "Draft", "classification": "government"})
        );
    }
}
