use proposal_flow::{DocBlock, DocumentOrigin, FileKind, SourceCategory};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Session-state keys shared across handlers.
pub mod session_keys {
    pub const SOURCES: &str = "sources";
    pub const EXTRACTED_TEXT: &str = "extracted_text";
    pub const PROPOSAL_SECTIONS: &str = "proposal_sections";
    pub const GENERATED_SECTIONS: &str = "generated_sections";
    pub const CLIENT_INFO: &str = "client_info";
    pub const YOUR_INFO: &str = "your_info";
    pub const PROPOSAL_SETTINGS: &str = "proposal_settings";
    pub const CURRENT_STEP: &str = "current_step";
    pub const CURRENT_SECTION: &str = "current_section";
    pub const STRUCTURE_LAST_MODIFIED: &str = "structure_last_modified";
    pub const COVER_PAGE: &str = "cover_page";
    pub const METADATA: &str = "metadata";
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub current_step: u8,
    pub current_section: usize,
    pub outline_sections: Vec<String>,
    pub drafted_sections: Vec<String>,
    pub corpus_chars: usize,
    pub proposal_settings: Value,
}

#[derive(Debug, Deserialize)]
pub struct UploadFile {
    pub name: String,
    pub category: SourceCategory,
    pub content_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadDocumentsRequest {
    pub origin: DocumentOrigin,
    pub files: Vec<UploadFile>,
}

#[derive(Debug, Serialize)]
pub struct ExtractedFileSummary {
    pub name: String,
    pub kind: FileKind,
    pub category: SourceCategory,
    pub chars: usize,
}

/// One failed file in an upload batch. Reported alongside successes; an
/// extraction failure never aborts the batch.
#[derive(Debug, Serialize)]
pub struct ExtractionFailureReport {
    pub file: String,
    pub cause: String,
}

#[derive(Debug, Serialize)]
pub struct UploadDocumentsResponse {
    pub extracted: Vec<ExtractedFileSummary>,
    pub failures: Vec<ExtractionFailureReport>,
}

#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    pub action: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct OutlineRequest {
    pub outline: String,
}

#[derive(Debug, Deserialize)]
pub struct InfoRequest {
    pub client_info: Option<Value>,
    pub your_info: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    #[serde(rename = "type")]
    pub proposal_type: String,
    pub tone: String,
}

#[derive(Debug, Deserialize)]
pub struct StepRequest {
    pub step: u8,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub feedback: String,
}

#[derive(Debug, Serialize)]
pub struct SectionDraftResponse {
    pub section: String,
    pub draft: String,
}

#[derive(Debug, Serialize)]
pub struct ClearSectionResponse {
    pub section: String,
    pub cleared: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportRequest {
    pub cover_page: Option<String>,
    pub metadata: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub file_name: String,
    pub blocks: Vec<DocBlock>,
    pub docx_base64: String,
}

/// Client/own-company organization info as kept in session state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<UploadedFileInfo>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFileInfo {
    pub name: String,
    pub category: SourceCategory,
}
