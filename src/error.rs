//! Unified error handling for the areal-route library.
//!
//! Every failure in this crate has a degraded-but-functional fallback, so
//! these errors rarely escape the public boundary. They exist so the
//! boundary code (catalog load, store access) can log what went wrong
//! before substituting a safe default.

use thiserror::Error;

/// Unified error type for areal-route operations.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Catalog document could not be read or parsed
    #[error("Catalog error: {message}")]
    Catalog { message: String },

    /// Route store read or write failed
    #[error("Storage error ({key}): {message}")]
    Storage { key: String, message: String },

    /// Configuration file was present but malformed
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// HTTP fetch failed
    #[error("HTTP error{}: {message}", .status_code.map(|c| format!(" ({})", c)).unwrap_or_default())]
    Http {
        message: String,
        status_code: Option<u16>,
    },

    /// Route export requested with nothing to navigate to
    #[error("Route is empty, nothing to export")]
    EmptyRoute,

    /// Knowledge table for the FAQ assistant could not be loaded
    #[error("Knowledge table error: {message}")]
    KnowledgeTable { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlannerError {
    pub(crate) fn storage(key: &str, message: impl Into<String>) -> Self {
        PlannerError::Storage {
            key: key.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn catalog(message: impl Into<String>) -> Self {
        PlannerError::Catalog {
            message: message.into(),
        }
    }
}

/// Result type alias for areal-route operations.
pub type Result<T> = std::result::Result<T, PlannerError>;

/// Extension trait for converting Option to PlannerError.
pub trait OptionExt<T> {
    /// Convert Option to Result with an empty-route error.
    fn ok_or_empty_route(self) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_empty_route(self) -> Result<T> {
        self.ok_or(PlannerError::EmptyRoute)
    }
}
