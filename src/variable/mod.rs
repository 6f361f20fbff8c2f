pub mod capture;
pub mod resolver;
pub mod stash;

pub use capture::{Capture, StashRule};
pub use resolver::{EnvSource, Placeholder, ValueSource, VariableResolver};
pub use stash::{Stash, StashEntry};
