//! Factory Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Declaring a type is the only place validation happens. Once a type exists,
//! constructing instances of it never fails; only later writes to read-only or
//! non-configurable properties can.

use derive_more::{Display, Error};

/// A factory error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for factory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A type name, property name or property description is malformed.
    #[display("invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] String),
    /// `_message` and `stack` are managed by the factory and cannot be declared.
    #[display("reserved property name: `{_0}`")]
    ReservedPropertyName(#[error(not(source))] String),
    /// The requested base is not the native error root or a type of this registry.
    #[display("invalid base type: `{_0}`")]
    InvalidBaseType(#[error(not(source))] String),
    /// Attempted to write a read-only property on an instance.
    #[display("cannot assign to read-only property `{_0}`")]
    ReadOnlyProperty(#[error(not(source))] String),
    /// Attempted to remove a non-configurable property from an instance.
    #[display("cannot remove non-configurable property `{_0}`")]
    NonConfigurableProperty(#[error(not(source))] String),
    /// A configured catalog entry could not be declared.
    #[display("invalid catalog entry: {_0}")]
    Catalog(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Declarations are deterministic: the same input fails the same way.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::ReservedPropertyName("_message".to_string()).to_string(),
            "reserved property name: `_message`"
        );
        assert_eq!(ErrorKind::InvalidBaseType("Foo".to_string()).to_string(), "invalid base type: `Foo`");
        assert_eq!(
            ErrorKind::ReadOnlyProperty("name".to_string()).to_string(),
            "cannot assign to read-only property `name`"
        );
    }

    #[test]
    fn error_kind_retryable() {
        assert!(!ErrorKind::InvalidArgument(String::new()).is_retryable());
        assert!(!ErrorKind::Catalog(String::new()).is_retryable());
    }
}
