use async_trait::async_trait;
use proposal_flow::{
    GenerationOutput, GenerationRequest, GenerationRoutine, ProposalError, Result,
};
use rig::completion::Prompt;
use tracing::info;

use super::classification::classify;
use super::tone::tone_settings_for;
use super::utils::{get_llm_agent, truncate_chars};

const MAX_RELEVANT_CHARS: usize = 3_000;

const TIMELINE_PREAMBLE: &str = "You are an expert project manager specializing in creating detailed \
and realistic project timelines.";

/// LLM-backed timeline / implementation-plan drafting.
pub struct TimelineRoutine;

pub(crate) fn build_timeline_prompt(
    classification: &str,
    tone: &super::tone::ToneSettings,
    relevant_text: &str,
    additional_context: Option<&str>,
) -> String {
    format!(
        "Client classification: {classification}\n\
         Tone: {tone}, Style: {style}\n\n\
         Project context:\n{context}\n\n\
         Additional requirements:\n{additional}\n\n\
         Create a detailed project timeline with:\n\
         1. Clear phases with specific durations (in weeks)\n\
         2. Key milestones and deliverables for each phase\n\
         3. Dependencies between phases\n\
         4. A realistic overall duration for a project of this scope",
        tone = tone.tone,
        style = tone.style,
        context = truncate_chars(relevant_text, MAX_RELEVANT_CHARS),
        additional = additional_context.unwrap_or("None"),
    )
}

#[async_trait]
impl GenerationRoutine for TimelineRoutine {
    fn name(&self) -> &str {
        "timeline"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput> {
        let GenerationRequest::GenerateTimeline {
            client_text,
            relevant_text,
            additional_context,
        } = request
        else {
            return Err(ProposalError::UpstreamGeneration(
                "timeline routine received a different action".to_string(),
            ));
        };

        let classification = classify(&client_text);
        let tone = tone_settings_for(classification);
        info!(classification, "drafting project timeline");

        let prompt = build_timeline_prompt(
            classification,
            &tone,
            &relevant_text,
            additional_context.as_deref(),
        );

        let agent = get_llm_agent(TIMELINE_PREAMBLE)
            .map_err(|e| ProposalError::UpstreamGeneration(e.to_string()))?;
        let timeline = agent
            .prompt(&prompt)
            .await
            .map_err(|e| ProposalError::UpstreamGeneration(e.to_string()))?;

        Ok(GenerationOutput::Timeline { timeline })
    }
}
