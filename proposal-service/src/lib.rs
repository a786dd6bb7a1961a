pub mod models;
pub mod routines;
pub mod service;
pub mod workflow;

pub use models::*;
pub use service::{AppState, create_app};
pub use workflow::{action_for_section, build_dispatcher, build_routines};
