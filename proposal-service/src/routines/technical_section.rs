use async_trait::async_trait;
use proposal_flow::{
    GenerationOutput, GenerationRequest, GenerationRoutine, ProposalError, Result,
};
use rig::completion::Prompt;
use tracing::info;

use super::classification::classify;
use super::industry_analysis::analyze_industry;
use super::tone::tone_settings_for;
use super::utils::{get_llm_agent, truncate_chars};

const MAX_CONTEXT_CHARS: usize = 12_000;

const TECHNICAL_PREAMBLE: &str = "You are an expert proposal writer specializing in technical approach \
sections for enterprise and government clients. You produce concrete, well-structured drafts grounded \
in the client's source documents, without inventing capabilities the documents do not support.";

/// LLM-backed technical-section drafting.
///
/// Classifies the client first, derives tone settings, and folds a
/// deterministic industry analysis into the prompt so the draft speaks the
/// client's language.
pub struct TechnicalSectionRoutine;

pub(crate) fn build_technical_prompt(
    classification: &str,
    tone: &super::tone::ToneSettings,
    industry_analysis: &str,
    extracted_text: &str,
    project_requirements: Option<&str>,
) -> String {
    format!(
        "Client classification: {classification}\n\
         Tone: {tone}, Style: {style}\n\n\
         Industry analysis:\n{industry_analysis}\n\n\
         Source document content:\n{context}\n\n\
         Project requirements:\n{requirements}\n\n\
         Draft the requested proposal content. Structure it with clear markdown headings \
         and keep every claim traceable to the source documents above.",
        tone = tone.tone,
        style = tone.style,
        context = truncate_chars(extracted_text, MAX_CONTEXT_CHARS),
        requirements = project_requirements.unwrap_or("None provided"),
    )
}

#[async_trait]
impl GenerationRoutine for TechnicalSectionRoutine {
    fn name(&self) -> &str {
        "technical_section"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput> {
        let GenerationRequest::GenerateTechnicalSection {
            client_text,
            extracted_text,
            project_requirements,
            include_classification,
        } = request
        else {
            return Err(ProposalError::UpstreamGeneration(
                "technical section routine received a different action".to_string(),
            ));
        };

        let classification = classify(&client_text);
        let tone = tone_settings_for(classification);
        let industry_analysis = analyze_industry(&extracted_text);
        info!(classification, tone = tone.tone, "drafting technical section");

        let prompt = build_technical_prompt(
            classification,
            &tone,
            &industry_analysis,
            &extracted_text,
            project_requirements.as_deref(),
        );

        let agent = get_llm_agent(TECHNICAL_PREAMBLE)
            .map_err(|e| ProposalError::UpstreamGeneration(e.to_string()))?;
        let technical_solution = agent
            .prompt(&prompt)
            .await
            .map_err(|e| ProposalError::UpstreamGeneration(e.to_string()))?;

        Ok(GenerationOutput::TechnicalSection {
            technical_solution,
            classification: include_classification.then(|| classification.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_classification_tone_and_requirements() {
        let tone = tone_settings_for("government");
        let prompt = build_technical_prompt(
            "government",
            &tone,
            "Industry context: government",
            "RFP body text",
            Some("Address Section C requirements"),
        );
        assert!(prompt.contains("Client classification: government"));
        assert!(prompt.contains("Tone: Formal, Style: Compliance-focused"));
        assert!(prompt.contains("RFP body text"));
        assert!(prompt.contains("Address Section C requirements"));
    }

    #[test]
    fn prompt_context_is_bounded() {
        let tone = tone_settings_for("enterprise");
        let long_text = "x".repeat(MAX_CONTEXT_CHARS * 2);
        let prompt = build_technical_prompt("enterprise", &tone, "", &long_text, None);
        assert!(prompt.len() < MAX_CONTEXT_CHARS + 2_000);
    }
}
