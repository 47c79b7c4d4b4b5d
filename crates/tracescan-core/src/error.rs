//! Error types for predicate compilation and store scans.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, machine-readable error codes for FFI consumers.
///
/// These codes form a **stable API contract**. Once published, variant names
/// and their serialized `snake_case` strings must never change across
/// versions; foreign callers dispatch on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCode {
    /// The query buffer is not well-formed JSON.
    JsonParseError,
    /// The `type` tag does not name a known predicate variant.
    UnknownType,
    /// A required field is absent from a predicate node.
    MissingField,
    /// A required field is present but has the wrong JSON kind.
    InvalidField,
    /// A `column` string does not parse under the path grammar.
    PathSyntax,
    /// An `op` string does not name a comparison operator.
    InvalidOperator,
    /// The store could not be opened.
    OpenFailure,
    /// The store reported corruption or an IO error mid-scan.
    IterationFailure,
    /// A secondary-only operation was invoked on a read-only instance.
    NotSecondary,
    /// A secondary instance failed to catch up with its primary.
    CatchUpFailure,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown predicate type tag: {tag}")]
    UnknownType { tag: i64 },

    #[error("Missing field `{field}` in predicate node")]
    MissingField { field: &'static str },

    #[error("Field `{field}` must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Path syntax error in `{path}`: {message}")]
    PathSyntax { path: String, message: String },

    #[error("Invalid comparison operator `{op}`")]
    InvalidOperator { op: String },

    #[error("Failed to open store: {0}")]
    Open(#[source] rocksdb::Error),

    #[error("Store iteration failed: {0}")]
    Iteration(#[source] rocksdb::Error),

    #[error("Instance is not in secondary mode")]
    NotSecondary,

    #[error("Secondary catch-up failed: {0}")]
    CatchUp(#[source] rocksdb::Error),
}

impl Error {
    /// Returns the stable error code for this error variant.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Error::Json(_) => ErrorCode::JsonParseError,
            Error::UnknownType { .. } => ErrorCode::UnknownType,
            Error::MissingField { .. } => ErrorCode::MissingField,
            Error::InvalidField { .. } => ErrorCode::InvalidField,
            Error::PathSyntax { .. } => ErrorCode::PathSyntax,
            Error::InvalidOperator { .. } => ErrorCode::InvalidOperator,
            Error::Open(_) => ErrorCode::OpenFailure,
            Error::Iteration(_) => ErrorCode::IterationFailure,
            Error::NotSecondary => ErrorCode::NotSecondary,
            Error::CatchUp(_) => ErrorCode::CatchUpFailure,
        }
    }

    /// True for errors produced while compiling a predicate, as opposed to
    /// errors from the store itself.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self.error_code(),
            ErrorCode::JsonParseError
                | ErrorCode::UnknownType
                | ErrorCode::MissingField
                | ErrorCode::InvalidField
                | ErrorCode::PathSyntax
                | ErrorCode::InvalidOperator
        )
    }

    /// Produces a structured JSON error for FFI consumers.
    ///
    /// Format: `{"code": "...", "message": "..."}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        })
    }
}
