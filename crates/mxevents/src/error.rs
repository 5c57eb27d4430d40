//! Error types for the event-content registry, codec and drift validator.
//!
//! Content decoding itself never fails: values that do not fit a declared
//! field are kept as residue. Errors only exist at the edges: registry
//! construction, envelope structure, and the validator entry point.

use thiserror::Error;

/// Matrix-style error codes attached to every error in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// M_NOT_FOUND: requested model does not exist
    NotFound,
    /// M_TOO_LARGE: payload exceeds a configured bound
    TooLarge,
    /// M_BAD_JSON: tree is JSON but not the expected structure
    BadJson,
    /// M_NOT_JSON: input bytes are not JSON at all
    NotJson,
    /// M_UNKNOWN: configuration problem with no client-facing cause
    Unknown,
}

impl ErrorCode {
    /// Returns the wire error code string (e.g., "M_NOT_FOUND").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "M_NOT_FOUND",
            ErrorCode::TooLarge => "M_TOO_LARGE",
            ErrorCode::BadJson => "M_BAD_JSON",
            ErrorCode::NotJson => "M_NOT_JSON",
            ErrorCode::Unknown => "M_UNKNOWN",
        }
    }
}

/// Configuration error raised while building a [`Registry`](crate::Registry).
///
/// These are fatal: a registry that fails to build must not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("wire type {wire_name:?} is claimed by both {existing} and {conflicting}")]
    DuplicateWireName {
        wire_name: String,
        existing: &'static str,
        conflicting: &'static str,
    },

    #[error("{type_name} declares field {field:?}, which is reserved by the event envelope")]
    ReservedFieldName {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("{type_name} declares field {field:?} more than once")]
    DuplicateFieldName {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("{type_name} has no wire type bindings")]
    NoBindings { type_name: &'static str },

    #[error("{type_name} has an empty wire type binding")]
    EmptyWireName { type_name: &'static str },
}

impl RegistryError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::Unknown
    }
}

/// Structural failure while splitting an event envelope from its content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("input is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("{context} is not a JSON object")]
    NotAnObject { context: &'static str },

    #[error("event is missing required field {field:?}")]
    MissingField { field: &'static str },

    #[error("event field {field:?} must be a string")]
    NotAString { field: &'static str },
}

impl DecodeError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            DecodeError::InvalidJson(_) => ErrorCode::NotJson,
            _ => ErrorCode::BadJson,
        }
    }
}

/// Request-level failure from the drift validator.
///
/// Finding extra fields is not an error; it is reported through
/// [`DriftReport`](crate::validate::DriftReport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("model {name:?} not found")]
    ModelNotFound { name: String },

    #[error("payload nesting at {path} exceeds maximum depth {max}")]
    TooDeep { path: String, max: usize },
}

impl ValidationError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ValidationError::ModelNotFound { .. } => ErrorCode::NotFound,
            ValidationError::TooDeep { .. } => ErrorCode::TooLarge,
        }
    }
}
