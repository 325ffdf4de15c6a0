//! @ai:module:intent Define error types for dataset, inference and scoring operations
//! @ai:module:layer domain
//! @ai:module:public_api EvalError, Result
//! @ai:module:stateless true

use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Unified error type for library operations
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid session file {path}: {message}")]
    InvalidSession { path: PathBuf, message: String },

    #[error("Unknown complexity category: {0}")]
    UnknownCategory(String),

    #[error("Invalid test case name '{0}': use letters, digits, '-' or '_'")]
    InvalidTestCaseName(String),

    #[error("Test case already registered: {0}")]
    DuplicateTestCase(String),

    #[error("Inference API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No workflow JSON found in model output")]
    NoWorkflowJson,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EvalError {
    /// @ai:intent Whether a failed inference call is worth retrying
    /// @ai:effects pure
    pub fn is_retryable(&self) -> bool {
        match self {
            EvalError::Api { status, .. } => *status == 429 || *status >= 500,
            EvalError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttling_and_server_errors_are_retryable() {
        let throttled = EvalError::Api {
            status: 429,
            body: "ThrottlingException".to_string(),
        };
        let unavailable = EvalError::Api {
            status: 503,
            body: String::new(),
        };
        assert!(throttled.is_retryable());
        assert!(unavailable.is_retryable());
    }

    #[test]
    fn test_client_errors_fail_fast() {
        let denied = EvalError::Api {
            status: 403,
            body: "AccessDeniedException".to_string(),
        };
        assert!(!denied.is_retryable());
        assert!(!EvalError::NoWorkflowJson.is_retryable());
    }
}
