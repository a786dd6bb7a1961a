use async_trait::async_trait;
use proposal_flow::{
    GenerationOutput, GenerationRequest, GenerationRoutine, ProposalError, Result,
};
use tracing::info;

/// Weighted keyword groups per organization type. Group weight reflects
/// how strong a signal that vocabulary is.
const GOVERNMENT_KEYWORDS: [(&[&str], u32); 5] = [
    (
        &["federal", "national", "united states", "federal agency", "u.s. government"],
        3,
    ),
    (&["state government", "state agency", "state of"], 3),
    (&["municipal", "county", "city of", "local government", "town"], 3),
    (
        &["defense", "military", "army", "navy", "air force", "marines", "dod"],
        3,
    ),
    (&["public sector", "government", "govt"], 2),
];

const ENTERPRISE_KEYWORDS: [(&[&str], u32); 6] = [
    (
        &["private", "corporation", "inc", "llc", "company", "business", "enterprise"],
        2,
    ),
    (&["bank", "financial", "investment", "insurance", "capital", "fintech"], 2),
    (&["healthcare", "hospital", "medical", "health system", "clinic", "pharma"], 2),
    (&["tech", "software", "it company", "technology", "digital"], 2),
    (&["retail", "store", "e-commerce", "consumer goods"], 2),
    (&["manufacturing", "factory", "production", "industrial"], 2),
];

const NON_PROFIT_KEYWORDS: [&str; 6] =
    ["non-profit", "nonprofit", "ngo", "foundation", "charity", "501c"];

const ACADEMIC_KEYWORDS: [&str; 6] =
    ["university", "school", "college", "education", "academy", "institute"];

fn weighted_score(text: &str, groups: &[(&[&str], u32)]) -> u32 {
    groups
        .iter()
        .map(|(keywords, weight)| {
            let hits = keywords.iter().filter(|k| text.contains(*k)).count() as u32;
            hits * weight
        })
        .sum()
}

fn flat_score(text: &str, keywords: &[&str]) -> u32 {
    // Flat groups carry the same weight as a strong government signal so
    // "university" is not drowned out by a stray "company".
    keywords.iter().filter(|k| text.contains(*k)).count() as u32 * 3
}

/// Classify a client organization from descriptive text.
///
/// Deterministic weighted keyword scoring; ties and no-signal inputs fall
/// back to "enterprise", matching the coordinator's historical default.
pub fn classify(text: &str) -> &'static str {
    let lower = text.to_lowercase();

    let scores = [
        ("government", weighted_score(&lower, &GOVERNMENT_KEYWORDS)),
        ("enterprise", weighted_score(&lower, &ENTERPRISE_KEYWORDS)),
        ("non-profit", flat_score(&lower, &NON_PROFIT_KEYWORDS)),
        ("academic", flat_score(&lower, &ACADEMIC_KEYWORDS)),
    ];

    match scores.iter().max_by_key(|(_, score)| *score) {
        Some(&(label, score)) if score > 0 => label,
        _ => "enterprise",
    }
}

/// Deterministic classification routine; no external service involved.
pub struct ClassificationRoutine;

#[async_trait]
impl GenerationRoutine for ClassificationRoutine {
    fn name(&self) -> &str {
        "classification"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput> {
        let GenerationRequest::Classify { client_text } = request else {
            return Err(ProposalError::UpstreamGeneration(
                "classification routine received a different action".to_string(),
            ));
        };

        let classification = classify(&client_text);
        info!(classification, "classified client organization");
        Ok(GenerationOutput::Classification {
            classification: classification.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn federal_language_is_government() {
        assert_eq!(
            classify("A federal agency within the U.S. Department of Defense"),
            "government"
        );
    }

    #[test]
    fn commercial_language_is_enterprise() {
        assert_eq!(
            classify("A retail e-commerce company selling consumer goods"),
            "enterprise"
        );
    }

    #[test]
    fn universities_are_academic() {
        assert_eq!(classify("A public research university"), "academic");
    }

    #[test]
    fn charities_are_non_profit() {
        assert_eq!(classify("An international NGO and charity"), "non-profit");
    }

    #[test]
    fn no_signal_defaults_to_enterprise() {
        assert_eq!(classify("An organization"), "enterprise");
    }

    #[tokio::test]
    async fn routine_wraps_the_classifier() {
        let output = ClassificationRoutine
            .generate(GenerationRequest::Classify {
                client_text: "State of Oregon agency".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(output.classification(), Some("government"));
    }
}
