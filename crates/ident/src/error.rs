//! Identifier Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An identifier validation error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for identifier validation.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The candidate cannot be used as an identifier. Pick another name.
    #[display("invalid identifier: `{_0}`")]
    Invalid(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A name is either an identifier or it isn't.
        false
    }
}
