use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::dispatch::{Dispatcher, GenerationRequest};
use crate::error::{ProposalError, Result};
use crate::outline::ProposalOutline;

/// Current draft text per proposal section, keyed by the section name as
/// it appeared in the outline at generation time.
///
/// Only the current version of each draft is held. A key exists only after
/// an explicit store or feedback-apply; clearing removes the key entirely.
/// Keys referencing sections later removed from the outline are kept —
/// reconciliation is a deliberate manual step (see DESIGN.md).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionDraftStore {
    drafts: HashMap<String, String>,
}

impl SectionDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or overwrite the draft for a section.
    pub fn store_draft(&mut self, section: impl Into<String>, draft: impl Into<String>) {
        let section = section.into();
        debug!(section = %section, "storing section draft");
        self.drafts.insert(section, draft.into());
    }

    pub fn draft(&self, section: &str) -> Option<&str> {
        self.drafts.get(section).map(String::as_str)
    }

    /// Remove a section's draft. Clearing an absent key is a no-op.
    pub fn clear(&mut self, section: &str) -> bool {
        self.drafts.remove(section).is_some()
    }

    /// Revise an existing draft with user feedback.
    ///
    /// The stored draft is replaced only after the revision routine
    /// succeeds — on any failure the previous draft stays untouched, and
    /// the store never holds both versions.
    pub async fn apply_feedback(
        &mut self,
        section: &str,
        feedback: &str,
        dispatcher: &Dispatcher,
    ) -> Result<String> {
        let current = self
            .drafts
            .get(section)
            .cloned()
            .ok_or_else(|| ProposalError::NoDraftToRevise(section.to_string()))?;

        let output = dispatcher
            .dispatch(GenerationRequest::ApplyUserFeedback {
                current_draft: current,
                user_feedback: feedback.to_string(),
            })
            .await?;

        let revised = output
            .revised_draft()
            .ok_or_else(|| {
                ProposalError::UpstreamGeneration(
                    "feedback routine returned no revised draft".to_string(),
                )
            })?
            .to_string();

        info!(section = %section, "replacing draft with revision");
        self.drafts.insert(section.to_string(), revised.clone());
        Ok(revised)
    }

    /// Read-only view over (section, draft) pairs in outline order,
    /// skipping sections that have no draft.
    pub fn ordered<'a>(&'a self, outline: &'a ProposalOutline) -> Vec<(&'a str, &'a str)> {
        outline
            .sections
            .iter()
            .filter_map(|section| {
                self.drafts
                    .get(&section.title)
                    .map(|draft| (section.title.as_str(), draft.as_str()))
            })
            .collect()
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.drafts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}
