pub mod core;
pub mod db;
pub mod edgar;
pub mod fsds;
pub mod repl;
pub mod utils;

// Re-exports
pub use crate::core::config::LoaderConfig;
pub use crate::core::errors::{LoadError, Result};
pub use crate::core::types::{ResetMode, Selection};
pub use crate::fsds::{Pipeline, RunSummary};
pub use utils::progress::ProgressTracker;
