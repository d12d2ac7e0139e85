//! Shared error types used across rusty-cache-control crates.

use thiserror::Error;

/// Errors raised while building object keys.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Identifier is empty once surrounding separators are stripped.
    #[error("Identifier '{identifier}' does not name an object")]
    EmptyIdentifier {
        /// The identifier as supplied.
        identifier: String,
    },

    /// Identifier contains a `.` or `..` segment.
    #[error("Identifier '{identifier}' contains a relative segment")]
    RelativeSegment {
        /// The identifier as supplied.
        identifier: String,
    },
}
