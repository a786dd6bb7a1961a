use async_trait::async_trait;
use proposal_flow::{
    GenerationOutput, GenerationRequest, GenerationRoutine, ProposalError, Result,
};
use tracing::info;

struct IndustryProfile {
    name: &'static str,
    keywords: &'static [&'static str],
    talking_points: &'static [&'static str],
    compliance_notes: &'static str,
}

static INDUSTRY_PROFILES: [IndustryProfile; 5] = [
    IndustryProfile {
        name: "healthcare",
        keywords: &[
            "healthcare", "hospital", "medical", "clinic", "patient", "physician", "ehr",
            "electronic health record", "hipaa", "telehealth", "pharmaceutical", "clinical",
        ],
        talking_points: &[
            "Ensuring HIPAA compliance and patient data security is paramount to any healthcare solution.",
            "Modern healthcare organizations require seamless integration between clinical and administrative systems.",
            "Solutions that enhance patient engagement while maintaining privacy are highly valued in healthcare.",
            "Interoperability with existing Electronic Health Record (EHR) systems is a critical requirement.",
        ],
        compliance_notes: "HIPAA, HITECH Act, FDA regulations for medical devices, state-specific healthcare regulations",
    },
    IndustryProfile {
        name: "finance",
        keywords: &[
            "finance", "bank", "investment", "insurance", "financial", "credit", "lending",
            "fintech", "payment", "transaction", "trading", "portfolio",
        ],
        talking_points: &[
            "Financial institutions require robust security measures that meet regulatory standards while enabling business agility.",
            "Solutions must address the challenge of legacy system integration without disrupting critical financial operations.",
            "Regulatory compliance including AML, KYC, and fraud detection should be built into any financial technology solution.",
            "Real-time processing and high availability are non-negotiable for financial transaction systems.",
        ],
        compliance_notes: "SEC regulations, Gramm-Leach-Bliley Act, Dodd-Frank, PCI DSS, Basel frameworks",
    },
    IndustryProfile {
        name: "government",
        keywords: &[
            "government", "federal", "agency", "public sector", "state", "municipal", "fedramp",
            "procurement", "rfp compliance", "citizen services",
        ],
        talking_points: &[
            "Government agencies prioritize solutions with proven security certifications such as FedRAMP.",
            "Transparency and auditability are essential across the full lifecycle of public-sector systems.",
            "Accessibility compliance (Section 508) must be addressed for citizen-facing services.",
            "Zero-trust architecture is increasingly mandated across federal modernization programs.",
        ],
        compliance_notes: "FedRAMP, FISMA, Section 508 accessibility, NIST 800-53, state procurement rules",
    },
    IndustryProfile {
        name: "education",
        keywords: &[
            "school", "university", "college", "education", "student", "learning", "campus",
            "curriculum", "lms",
        ],
        talking_points: &[
            "Education institutions need solutions that support both in-person and remote learning models.",
            "Student data privacy under FERPA shapes every data-handling decision.",
            "Integration with existing Learning Management Systems reduces adoption friction.",
        ],
        compliance_notes: "FERPA, COPPA for minors, state education data regulations",
    },
    IndustryProfile {
        name: "retail",
        keywords: &[
            "retail", "store", "shop", "e-commerce", "inventory", "pos", "customer loyalty",
            "merchandising", "omnichannel",
        ],
        talking_points: &[
            "Retailers are seeking unified views of inventory and customers across channels.",
            "Peak-season scalability must be demonstrated, not promised.",
            "Payment processing must maintain PCI DSS compliance end to end.",
        ],
        compliance_notes: "PCI DSS, consumer protection regulations, state sales-tax rules",
    },
];

fn detect_industry(text: &str) -> Option<&'static IndustryProfile> {
    let lower = text.to_lowercase();
    INDUSTRY_PROFILES
        .iter()
        .map(|profile| {
            let hits = profile
                .keywords
                .iter()
                .filter(|k| lower.contains(*k))
                .count();
            (profile, hits)
        })
        .filter(|(_, hits)| *hits > 0)
        .max_by_key(|(_, hits)| *hits)
        .map(|(profile, _)| profile)
}

/// Produce an industry analysis for the given document text.
///
/// Deterministic keyword detection over a fixed industry table; text with
/// no recognizable industry signal yields a general analysis rather than
/// an error.
pub fn analyze_industry(text: &str) -> String {
    match detect_industry(text) {
        Some(profile) => {
            info!(industry = profile.name, "detected industry context");
            let mut analysis = format!("Industry context: {}\n\nKey talking points:\n", profile.name);
            for point in profile.talking_points {
                analysis.push_str("- ");
                analysis.push_str(point);
                analysis.push('\n');
            }
            analysis.push_str("\nCompliance considerations: ");
            analysis.push_str(profile.compliance_notes);
            analysis
        }
        None => {
            info!("no industry signal detected, using general analysis");
            "Industry context: general\n\nKey talking points:\n\
             - Focus on the client's stated objectives and measurable outcomes.\n\
             - Emphasize proven delivery methodology and risk management.\n\
             - Highlight relevant past performance and references.\n\n\
             Compliance considerations: standard contractual and data-protection obligations"
                .to_string()
        }
    }
}

/// Deterministic industry-analysis routine; no external service involved.
pub struct IndustryAnalysisRoutine;

#[async_trait]
impl GenerationRoutine for IndustryAnalysisRoutine {
    fn name(&self) -> &str {
        "industry_analysis"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput> {
        let GenerationRequest::AnalyzeIndustry { extracted_text } = request else {
            return Err(ProposalError::UpstreamGeneration(
                "industry analysis routine received a different action".to_string(),
            ));
        };

        Ok(GenerationOutput::IndustryAnalysis {
            industry_analysis: analyze_industry(&extracted_text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hospital_documents_detect_healthcare() {
        let analysis = analyze_industry("The hospital needs an EHR integration for patient records");
        assert!(analysis.starts_with("Industry context: healthcare"));
        assert!(analysis.contains("HIPAA"));
    }

    #[test]
    fn unrecognized_text_gets_general_analysis() {
        let analysis = analyze_industry("We enjoy long walks on the beach");
        assert!(analysis.starts_with("Industry context: general"));
    }

    #[test]
    fn strongest_signal_wins() {
        let text = "A bank branch inside a retail store: lending, credit, investment, trading";
        let analysis = analyze_industry(text);
        assert!(analysis.starts_with("Industry context: finance"));
    }

    #[tokio::test]
    async fn routine_produces_the_named_output_field() {
        let output = IndustryAnalysisRoutine
            .generate(GenerationRequest::AnalyzeIndustry {
                extracted_text: "municipal public sector procurement".to_string(),
            })
            .await
            .unwrap();
        assert!(output.industry_analysis().unwrap().contains("government"));
    }
}
