use dashmap::DashMap;
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Keys that survive a session reset.
pub const PRESERVED_KEYS: [&str; 3] = ["client_info", "your_info", "proposal_settings"];

/// Default proposal settings applied on session creation and reset.
pub fn default_proposal_settings() -> Value {
    json!({ "type": "Government", "tone": "Formal" })
}

/// One-shot UI-control keys. Excluded from load even when present in a
/// persisted session file, and filtered out on save.
const TRANSIENT_KEYS: [&str; 24] = [
    // upload controls
    "client_files",
    "your_files",
    // navigation buttons
    "nav_go_back",
    "btn_nav_go_back",
    "nav_save_next",
    "btn_nav_save_next",
    "start_over",
    "nav_back_section2",
    "nav_next_section2",
    "nav_back_section3",
    "nav_next_section3",
    "nav_back_section4",
    // tab navigation
    "continue_to_analysis",
    "proceed_to_brainstorm",
    "back_to_upload",
    "skip_to_next",
    // section controls
    "prev_section_btn",
    "next_section_btn",
    "refresh_preview_btn",
    // action buttons
    "extract_key_info",
    "extract_req_btn",
    "gen_tech_btn",
    "gen_doc_btn",
    "download_btn",
];

/// Prefixes of dynamically generated per-section control keys, also
/// excluded from persistence.
const TRANSIENT_PREFIXES: [&str; 7] = [
    "gen_btn_",
    "clear_btn_",
    "feedback_",
    "edit_",
    "client_category_",
    "your_category_",
    "check_",
];

pub fn is_transient_key(key: &str) -> bool {
    TRANSIENT_KEYS.contains(&key) || TRANSIENT_PREFIXES.iter().any(|p| key.starts_with(p))
}

/// Flat key/value session state shared across the pipeline.
///
/// Cheap to clone; all clones observe the same underlying map. Values are
/// JSON so the whole state can be snapshotted to a flat document and
/// reloaded at session start.
#[derive(Clone, Debug)]
pub struct SessionState {
    data: Arc<DashMap<String, Value>>,
}

impl SessionState {
    pub fn new() -> Self {
        let state = Self::empty();
        state.ensure_defaults();
        state
    }

    /// A state with no keys at all. Used when rehydrating from a persisted
    /// snapshot, where defaults must not shadow stored values.
    pub fn empty() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
        }
    }

    /// Fill in proposal settings and workflow position when absent.
    pub fn ensure_defaults(&self) {
        if !self.data.contains_key("proposal_settings") {
            self.set_value("proposal_settings", default_proposal_settings());
        }
        if !self.data.contains_key("current_step") {
            self.set_value("current_step", json!(1));
        }
    }

    pub fn set(&self, key: impl Into<String>, value: impl serde::Serialize) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.data.insert(key.into(), value);
    }

    fn set_value(&self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }

    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get::<String>(key)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.data.remove(key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Snapshot the state as a sorted flat map, minus transient keys.
    pub fn snapshot(&self) -> Map<String, Value> {
        let mut entries: Vec<(String, Value)> = self
            .data
            .iter()
            .filter(|e| !is_transient_key(e.key()))
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.into_iter().collect()
    }

    /// Merge a persisted flat map into this state. Transient keys are
    /// skipped, and keys already present in memory are not overwritten.
    pub fn load_from(&self, map: &Map<String, Value>) {
        for (key, value) in map {
            if is_transient_key(key) {
                continue;
            }
            if self.data.contains_key(key) {
                continue;
            }
            self.data.insert(key.clone(), value.clone());
        }
    }

    /// Clear all keys except the preserved subset, reinitialize proposal
    /// settings to their defaults, and return to workflow step 1.
    pub fn reset(&self) {
        self.data.retain(|key, _| PRESERVED_KEYS.contains(&key.as_str()));
        self.set_value("proposal_settings", default_proposal_settings());
        self.set_value("current_step", json!(1));
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
