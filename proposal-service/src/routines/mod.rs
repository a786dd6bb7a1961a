// Generation routines behind the dispatcher's five slots.
pub mod classification;
pub mod industry_analysis;
pub mod technical_section;
pub mod timeline;
pub mod user_feedback;

// Shared modules
pub mod tone;
pub mod utils;

// Re-export routine implementations
pub use classification::ClassificationRoutine;
pub use industry_analysis::IndustryAnalysisRoutine;
pub use technical_section::TechnicalSectionRoutine;
pub use timeline::TimelineRoutine;
pub use user_feedback::UserFeedbackRoutine;
