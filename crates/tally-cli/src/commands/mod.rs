//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (open_db, open_engine, load_config)
//! - `categorize` - Prediction and feedback commands (categorize, feedback, normalize)
//! - `training` - Model commands (train, eval, import)
//! - `status` - Status/categories/rules/corrections commands

pub mod categorize;
pub mod core;
pub mod status;
pub mod training;

// Re-export command functions for main.rs
pub use categorize::*;
pub use core::*;
pub use status::*;
pub use training::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
