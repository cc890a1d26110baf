//! Error types for the management information store
//!
//! Two families live here:
//!
//! - [`ErrorStatus`]: protocol-level outcomes of a write. These are normal
//!   results handed back to the manager, never faults.
//! - [`StoreError`]: infrastructure failures (file I/O, malformed state,
//!   registry construction).

use std::fmt;

use crate::mib::oid::Oid;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a rejected write, reported per item to the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStatus {
    /// The identifier is not registered
    NoSuchObject,

    /// The object is registered but read-only
    NotWritable,

    /// The proposed value has a different kind than the object
    WrongType,

    /// The proposed value violates the object's length/range constraints
    WrongValue,

    /// The requester lacks write permission or could not be identified
    AuthorizationError,
}

impl ErrorStatus {
    /// SNMPv2 error-status code
    pub fn code(self) -> u32 {
        match self {
            ErrorStatus::WrongType => 7,
            ErrorStatus::WrongValue => 10,
            ErrorStatus::AuthorizationError => 16,
            ErrorStatus::NotWritable => 17,
            ErrorStatus::NoSuchObject => 18,
        }
    }

    /// Stable snake_case name used on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorStatus::NoSuchObject => "no_such_object",
            ErrorStatus::NotWritable => "not_writable",
            ErrorStatus::WrongType => "wrong_type",
            ErrorStatus::WrongValue => "wrong_value",
            ErrorStatus::AuthorizationError => "authorization_error",
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorStatus::NoSuchObject => write!(f, "no such object"),
            ErrorStatus::NotWritable => write!(f, "object is not writable"),
            ErrorStatus::WrongType => write!(f, "wrong value type"),
            ErrorStatus::WrongValue => write!(f, "value violates constraints"),
            ErrorStatus::AuthorizationError => write!(f, "requester is not authorized"),
        }
    }
}

/// Errors that can occur while building, loading or persisting the store
#[derive(Debug)]
pub enum StoreError {
    /// Two registry entries share an identifier
    DuplicateOid(Oid),

    /// An identifier string could not be parsed
    InvalidOid(String),

    /// An internal write targeted an identifier the registry doesn't know
    UnknownObject(Oid),

    /// State document could not be (de)serialized
    SerializationError(serde_json::Error),

    /// I/O error (file access, rename, etc.)
    IoError(std::io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DuplicateOid(oid) => write!(f, "duplicate object identifier {oid}"),
            StoreError::InvalidOid(text) => write!(f, "invalid object identifier '{text}'"),
            StoreError::UnknownObject(oid) => write!(f, "object {oid} is not registered"),
            StoreError::SerializationError(err) => write!(f, "state serialization error: {err}"),
            StoreError::IoError(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::SerializationError(err) => Some(err),
            StoreError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::IoError(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::SerializationError(err)
    }
}
