//! Error types for qtree
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown quest/tree/category, bad config)
//! - 3: Rejected (guarded action was a no-op, confirmation missing)
//! - 4: Operation failed (IO, serialization, locking, store)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the qtree CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const REJECTED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for qtree operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Quest not found: {0}")]
    QuestNotFound(String),

    #[error("Tree not found: {0}")]
    TreeNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Store not initialized at {0}")]
    NotInitialized(PathBuf),

    // Rejections (exit code 3)
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Confirmation required to {0}")]
    ConfirmationRequired(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::QuestNotFound(_)
            | Error::TreeNotFound(_)
            | Error::CategoryNotFound(_)
            | Error::NotInitialized(_) => exit_codes::USER_ERROR,

            // Rejections
            Error::Rejected(_) | Error::ConfirmationRequired(_) => exit_codes::REJECTED,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::Store(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::QuestNotFound(id) => Some(serde_json::json!({ "quest_id": id })),
            Error::TreeNotFound(id) => Some(serde_json::json!({ "tree_id": id })),
            Error::CategoryNotFound(id) => Some(serde_json::json!({ "category_id": id })),
            Error::InvalidConfig(message)
            | Error::InvalidArgument(message)
            | Error::Rejected(message) => Some(serde_json::json!({ "message": message })),
            Error::ConfirmationRequired(action) => Some(serde_json::json!({ "action": action })),
            Error::NotInitialized(path) | Error::LockFailed(path) => {
                Some(serde_json::json!({ "path": path.to_string_lossy() }))
            }
            _ => None,
        }
    }
}

/// Result type alias for qtree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub message: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            message: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
