use async_trait::async_trait;
use proposal_flow::{
    GenerationOutput, GenerationRequest, GenerationRoutine, ProposalError, Result,
};
use rig::completion::Prompt;
use tracing::info;

use super::utils::get_llm_agent;

const FEEDBACK_PREAMBLE: &str = "You are an expert proposal writer with extensive experience in \
incorporating feedback effectively. When revising content:\n\
1. Maintain the original document structure\n\
2. Implement requested changes with precision\n\
3. Improve clarity and persuasiveness\n\
4. Maintain consistent tone and style throughout\n\
Return only the revised section text.";

/// LLM-backed revision of an existing draft against user feedback.
pub struct UserFeedbackRoutine;

pub(crate) fn build_feedback_prompt(current_draft: &str, user_feedback: &str) -> String {
    format!(
        "Current proposal section:\n```\n{current_draft}\n```\n\n\
         User feedback:\n{user_feedback}\n\n\
         Revise the section so it integrates the feedback seamlessly while keeping \
         everything that was not called out."
    )
}

#[async_trait]
impl GenerationRoutine for UserFeedbackRoutine {
    fn name(&self) -> &str {
        "user_feedback"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput> {
        let GenerationRequest::ApplyUserFeedback {
            current_draft,
            user_feedback,
        } = request
        else {
            return Err(ProposalError::UpstreamGeneration(
                "feedback routine received a different action".to_string(),
            ));
        };

        info!(draft_chars = current_draft.len(), "revising draft with user feedback");
        let prompt = build_feedback_prompt(&current_draft, &user_feedback);

        let agent = get_llm_agent(FEEDBACK_PREAMBLE)
            .map_err(|e| ProposalError::UpstreamGeneration(e.to_string()))?;
        let revised_draft = agent
            .prompt(&prompt)
            .await
            .map_err(|e| ProposalError::UpstreamGeneration(e.to_string()))?;

        Ok(GenerationOutput::RevisedDraft { revised_draft })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_quotes_draft_and_feedback() {
        let prompt = build_feedback_prompt("The draft body", "make it shorter");
        assert!(prompt.contains("The draft body"));
        assert!(prompt.contains("make it shorter"));
    }
}
