pub mod error;
pub mod http;
pub mod logger;
pub mod project;
pub mod resource;
pub mod runner;
pub mod utils;
pub mod variable;

// Re-export commonly used types
pub use error::{HttpuError, Result};
pub use project::{Project, current_session, load_project};
pub use resource::{Registry, Request, RequestSpec, Variant};
pub use runner::Executor;
pub use variable::{Stash, StashEntry};
