//! Error types for vmod
//!
//! All modules use `VmodResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vmod operations
pub type VmodResult<T> = Result<T, VmodError>;

/// All errors that can occur in vmod
#[derive(Error, Debug)]
pub enum VmodError {
    // Cache backend errors
    #[error("Invalid cache record {path}: {reason}")]
    CacheRecordInvalid { path: PathBuf, reason: String },

    #[error("Cache bootstrap failed: {0}")]
    Bootstrap(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VmodError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an invalid cache record error
    pub fn record_invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CacheRecordInvalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CacheRecordInvalid { .. } | Self::Json(_) => {
                Some("Delete the cache directory to rebuild it from scratch")
            }
            Self::Bootstrap(_) => Some("Check that the cache directory is readable"),
            _ => None,
        }
    }
}
