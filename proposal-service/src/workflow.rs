use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use proposal_flow::{
    DEFAULT_GENERATION_TIMEOUT, Dispatcher, RoutineSet, SectionDraftStore, SessionState,
    SourceAggregator,
};
use tracing::warn;

use crate::models::{OrganizationInfo, session_keys};
use crate::routines::{
    ClassificationRoutine, IndustryAnalysisRoutine, TechnicalSectionRoutine, TimelineRoutine,
    UserFeedbackRoutine,
};

pub fn build_routines() -> RoutineSet {
    RoutineSet {
        industry: Arc::new(IndustryAnalysisRoutine),
        technical: Arc::new(TechnicalSectionRoutine),
        timeline: Arc::new(TimelineRoutine),
        feedback: Arc::new(UserFeedbackRoutine),
        classification: Arc::new(ClassificationRoutine),
    }
}

pub fn build_dispatcher() -> Dispatcher {
    Dispatcher::new(build_routines()).with_timeout(generation_timeout())
}

fn generation_timeout() -> Duration {
    match std::env::var("GENERATION_TIMEOUT_SECS") {
        Ok(value) => match value.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!(%value, "ignoring invalid GENERATION_TIMEOUT_SECS");
                DEFAULT_GENERATION_TIMEOUT
            }
        },
        Err(_) => DEFAULT_GENERATION_TIMEOUT,
    }
}

/// Default-routine policy: which action drafts a given section.
///
/// Sections whose title mentions a timeline or implementation plan go to
/// the timeline routine; every other section — including unrecognized
/// ones — goes to technical-section drafting. Deliberately explicit so
/// tests can assert on it.
pub fn action_for_section(section_title: &str) -> &'static str {
    if section_title.contains("Timeline") || section_title.contains("Implementation") {
        "generate_timeline"
    } else {
        "generate_technical_section"
    }
}

/// Rebuild the source aggregator from its two flat session keys.
pub fn load_sources(state: &SessionState) -> SourceAggregator {
    let buckets: BTreeMap<String, String> = state.get(session_keys::SOURCES).unwrap_or_default();
    let corpus: String = state.get(session_keys::EXTRACTED_TEXT).unwrap_or_default();
    SourceAggregator::from_state(buckets, corpus)
}

pub fn save_sources(state: &SessionState, sources: &SourceAggregator) {
    state.set(session_keys::SOURCES, sources.bucket_map());
    state.set(session_keys::EXTRACTED_TEXT, sources.corpus());
}

pub fn load_drafts(state: &SessionState) -> SectionDraftStore {
    state.get(session_keys::GENERATED_SECTIONS).unwrap_or_default()
}

pub fn save_drafts(state: &SessionState, drafts: &SectionDraftStore) {
    state.set(session_keys::GENERATED_SECTIONS, drafts);
}

pub fn load_info(state: &SessionState, key: &str) -> OrganizationInfo {
    state.get(key).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proposal_flow::{DocumentOrigin, SourceCategory};

    #[test]
    fn timeline_and_implementation_sections_route_to_the_timeline_routine() {
        assert_eq!(action_for_section("Implementation Plan"), "generate_timeline");
        assert_eq!(action_for_section("Project Timeline"), "generate_timeline");
    }

    #[test]
    fn everything_else_routes_to_technical_drafting() {
        assert_eq!(action_for_section("Executive Summary"), "generate_technical_section");
        assert_eq!(action_for_section("Pricing Proposal"), "generate_technical_section");
        assert_eq!(action_for_section("Some Unrecognized Title"), "generate_technical_section");
    }

    #[test]
    fn sources_round_trip_through_session_state() {
        let state = SessionState::new();
        let mut sources = load_sources(&state);
        sources.record(DocumentOrigin::Client, SourceCategory::Rfp, "scope text");
        save_sources(&state, &sources);

        let reloaded = load_sources(&state);
        assert_eq!(reloaded.corpus(), "scope text");
        assert_eq!(
            reloaded.bucket(DocumentOrigin::Client, SourceCategory::Rfp),
            Some("scope text")
        );
    }

    #[test]
    fn drafts_round_trip_through_session_state() {
        let state = SessionState::new();
        let mut drafts = load_drafts(&state);
        drafts.store_draft("Pricing", "costs");
        save_drafts(&state, &drafts);

        let reloaded = load_drafts(&state);
        assert_eq!(reloaded.draft("Pricing"), Some("costs"));
    }
}
