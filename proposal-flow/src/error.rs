use thiserror::Error;

/// Error taxonomy for the proposal pipeline.
///
/// Every failure is surfaced to the immediate caller as a typed value. The
/// only silent cases are the documented ones: clearing an absent draft key
/// and skipping transient keys during session persistence.
#[derive(Error, Debug)]
pub enum ProposalError {
    /// Action identifier is not one of the enumerated generation actions.
    #[error("Unsupported action: {0}")]
    InvalidAction(String),

    /// A required parameter for the action is absent or empty.
    #[error("Missing required parameter '{param}' for action '{action}'")]
    MissingInput { action: String, param: String },

    /// The underlying generation routine failed, timed out, or returned
    /// output that does not satisfy its contract.
    #[error("Generation failed: {0}")]
    UpstreamGeneration(String),

    /// Feedback was applied to a section that has no stored draft.
    #[error("No draft to revise for section '{0}'")]
    NoDraftToRevise(String),

    /// A file could not be converted to text. Reported per file; callers
    /// must keep processing sibling files.
    #[error("Failed to extract text from '{file}': {cause}")]
    Extraction { file: String, cause: String },

    /// Session save/load failure. Non-fatal: the in-memory session keeps
    /// working without durable backing.
    #[error("Session persistence error: {0}")]
    Persistence(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Document export failure (docx assembly).
    #[error("Export failed: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, ProposalError>;
