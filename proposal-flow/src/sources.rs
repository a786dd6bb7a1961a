use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::extract::{DocumentOrigin, ExtractedDocument, SourceCategory};

/// Accumulates extracted text into named buckets keyed by origin and
/// category, and maintains one running corpus across both origins.
///
/// Buckets are created lazily on first write and never shrink within a
/// session. Recording is append-only with no deduplication: identical text
/// recorded twice appears twice. That is intentional — duplicate emphasis
/// in source material is preserved for the generation routines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceAggregator {
    buckets: BTreeMap<String, String>,
    corpus: String,
}

impl SourceAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an aggregator from separately persisted buckets and corpus.
    pub fn from_state(buckets: BTreeMap<String, String>, corpus: String) -> Self {
        Self { buckets, corpus }
    }

    pub fn bucket_map(&self) -> &BTreeMap<String, String> {
        &self.buckets
    }

    /// Bucket key for an (origin, category) pair, e.g. `client_RFP`.
    pub fn bucket_key(origin: DocumentOrigin, category: SourceCategory) -> String {
        format!("{}_{}", origin.prefix(), category)
    }

    /// Append text to the (origin, category) bucket and to the corpus.
    pub fn record(&mut self, origin: DocumentOrigin, category: SourceCategory, text: &str) {
        let key = Self::bucket_key(origin, category);
        debug!(bucket = %key, chars = text.len(), "recording source text");

        self.buckets
            .entry(key)
            .and_modify(|existing| {
                existing.push('\n');
                existing.push_str(text);
            })
            .or_insert_with(|| text.to_string());

        if self.corpus.is_empty() {
            self.corpus.push_str(text);
        } else {
            self.corpus.push_str("\n\n");
            self.corpus.push_str(text);
        }
    }

    /// Record an extracted document under its own origin and category.
    pub fn record_document(&mut self, document: &ExtractedDocument) {
        self.record(document.origin, document.category, &document.text);
    }

    pub fn bucket(&self, origin: DocumentOrigin, category: SourceCategory) -> Option<&str> {
        self.buckets
            .get(&Self::bucket_key(origin, category))
            .map(String::as_str)
    }

    /// The full concatenated extracted text across all uploads.
    pub fn corpus(&self) -> &str {
        &self.corpus
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    /// Buckets in deterministic key order.
    pub fn buckets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_appends_in_call_order() {
        let mut sources = SourceAggregator::new();
        sources.record(DocumentOrigin::Client, SourceCategory::Rfp, "text A");
        sources.record(DocumentOrigin::Client, SourceCategory::Rfp, "text B");

        assert_eq!(
            sources.bucket(DocumentOrigin::Client, SourceCategory::Rfp),
            Some("text A\ntext B")
        );
        assert_eq!(sources.corpus(), "text A\n\ntext B");
    }

    #[test]
    fn buckets_are_created_lazily_per_origin_and_category() {
        let mut sources = SourceAggregator::new();
        sources.record(DocumentOrigin::Client, SourceCategory::Rfp, "rfp");
        sources.record(DocumentOrigin::Company, SourceCategory::CaseStudy, "case");

        assert!(sources.bucket(DocumentOrigin::Client, SourceCategory::Rfp).is_some());
        assert!(sources.bucket(DocumentOrigin::Company, SourceCategory::Rfp).is_none());
        let keys: Vec<&str> = sources.buckets().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["client_RFP", "company_Case Study"]);
    }

    #[test]
    fn duplicate_text_is_preserved_twice() {
        let mut sources = SourceAggregator::new();
        sources.record(DocumentOrigin::Client, SourceCategory::Sow, "same");
        sources.record(DocumentOrigin::Client, SourceCategory::Sow, "same");

        assert_eq!(
            sources.bucket(DocumentOrigin::Client, SourceCategory::Sow),
            Some("same\nsame")
        );
    }
}
