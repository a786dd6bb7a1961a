pub mod context;
pub mod dispatch;
pub mod drafts;
pub mod error;
pub mod export;
pub mod extract;
pub mod outline;
pub mod sources;
pub mod storage;

// Re-export commonly used types
pub use context::{SessionState, default_proposal_settings, is_transient_key};
pub use dispatch::{
    ACTIONS, DEFAULT_GENERATION_TIMEOUT, Dispatcher, GenerationOutput, GenerationRequest,
    GenerationRoutine, RoutineSet,
};
pub use drafts::SectionDraftStore;
pub use error::{ProposalError, Result};
pub use export::{DocBlock, FrontMatter, ProposalDocument, build_document, to_docx_bytes};
pub use extract::{
    DocumentOrigin, ExtractedDocument, FileKind, SourceCategory, UploadedFile, extract,
};
pub use outline::{OutlineSection, ProposalOutline};
pub use sources::SourceAggregator;
pub use storage::{FileSessionStorage, InMemorySessionStorage, ProposalSession, SessionStorage};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EchoTechnical;

    #[async_trait]
    impl GenerationRoutine for EchoTechnical {
        async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput> {
            let GenerationRequest::GenerateTechnicalSection {
                client_text,
                include_classification,
                ..
            } = request
            else {
                return Err(ProposalError::UpstreamGeneration(
                    "unexpected request".to_string(),
                ));
            };
            Ok(GenerationOutput::TechnicalSection {
                technical_solution: format!("Approach for {client_text}"),
                classification: include_classification.then(|| "enterprise".to_string()),
            })
        }
    }

    struct Shorten;

    #[async_trait]
    impl GenerationRoutine for Shorten {
        async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput> {
            let GenerationRequest::ApplyUserFeedback { current_draft, .. } = request else {
                return Err(ProposalError::UpstreamGeneration(
                    "unexpected request".to_string(),
                ));
            };
            let shortened: String = current_draft.chars().take(8).collect();
            Ok(GenerationOutput::RevisedDraft {
                revised_draft: shortened,
            })
        }
    }

    struct Unreachable;

    #[async_trait]
    impl GenerationRoutine for Unreachable {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutput> {
            Err(ProposalError::UpstreamGeneration(
                "routine should not run in this test".to_string(),
            ))
        }
    }

    fn test_dispatcher() -> Dispatcher {
        let unused: Arc<dyn GenerationRoutine> = Arc::new(Unreachable);
        Dispatcher::new(RoutineSet {
            industry: unused.clone(),
            technical: Arc::new(EchoTechnical),
            timeline: unused.clone(),
            feedback: Arc::new(Shorten),
            classification: unused,
        })
    }

    #[tokio::test]
    async fn generate_then_revise_a_section_end_to_end() {
        let dispatcher = test_dispatcher();
        let outline = ProposalOutline::parse("- Executive Summary\n  * Value proposition\n");
        let mut drafts = SectionDraftStore::new();

        let output = dispatcher
            .dispatch(GenerationRequest::GenerateTechnicalSection {
                client_text: "Acme Corp".to_string(),
                extracted_text: "RFP scope".to_string(),
                project_requirements: Some("Value proposition".to_string()),
                include_classification: false,
            })
            .await
            .unwrap();
        drafts.store_draft("Executive Summary", output.technical_solution().unwrap());
        assert_eq!(drafts.draft("Executive Summary"), Some("Approach for Acme Corp"));

        let revised = drafts
            .apply_feedback("Executive Summary", "make it shorter", &dispatcher)
            .await
            .unwrap();
        assert_eq!(revised, "Approach");
        assert_eq!(drafts.ordered(&outline), vec![("Executive Summary", "Approach")]);
    }

    #[tokio::test]
    async fn aggregated_sources_feed_generation_and_export() {
        let mut sources = SourceAggregator::new();
        sources.record(
            DocumentOrigin::Client,
            SourceCategory::Rfp,
            "Deploy by Q3.",
        );
        sources.record(
            DocumentOrigin::Company,
            SourceCategory::CaseStudy,
            "We shipped a similar system.",
        );
        assert_eq!(sources.corpus(), "Deploy by Q3.\n\nWe shipped a similar system.");

        let dispatcher = test_dispatcher();
        let output = dispatcher
            .dispatch(GenerationRequest::GenerateTechnicalSection {
                client_text: "Acme Corp".to_string(),
                extracted_text: sources.corpus().to_string(),
                project_requirements: None,
                include_classification: true,
            })
            .await
            .unwrap();
        assert_eq!(output.classification(), Some("enterprise"));

        let outline = ProposalOutline::parse("- Technical Approach\n");
        let mut drafts = SectionDraftStore::new();
        drafts.store_draft("Technical Approach", output.technical_solution().unwrap());

        let document = build_document(&drafts, &outline, &FrontMatter::default());
        assert!(document.blocks.iter().any(|b| matches!(
            b,
            DocBlock::Heading { level: 2, text } if text == "Technical Approach"
        )));
    }

    #[tokio::test]
    async fn session_round_trip_through_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSessionStorage::new(dir.path());

        let session = ProposalSession::new();
        session.state.set("proposal_sections", "- Pricing\n");
        session
            .state
            .set("generated_sections", serde_json::json!({"Pricing": "body"}));
        storage.save(&session).await.unwrap();

        let loaded = storage.get(&session.id).await.unwrap().unwrap();
        assert_eq!(
            loaded.state.get_string("proposal_sections").unwrap(),
            "- Pricing\n"
        );
        let sections: serde_json::Value = loaded.state.get("generated_sections").unwrap();
        assert_eq!(sections["Pricing"], "body");
    }
}
