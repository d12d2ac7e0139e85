//! Error types for policy configuration.

use thiserror::Error;

/// Errors raised while compiling a policy rule table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// Glob pattern in a rule could not be compiled.
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Structured directive is internally inconsistent.
    #[error("Invalid cache directive in rule '{rule}': {reason}")]
    InvalidDirective { rule: String, reason: String },
}
