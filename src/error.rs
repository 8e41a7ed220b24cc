//! Error types for the Qualtrics client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use crate::identity::EntityKind;
use thiserror::Error;

/// The main error type for the Qualtrics client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// An error reported by the Qualtrics server in its JSON error envelope.
    #[error("Qualtrics error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// A non-2xx status outside the range Qualtrics documents an envelope for.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    // ============================================================================
    // Export Errors
    // ============================================================================
    #[error("Qualtrics timeout preparing file download after {timeout_ms}ms")]
    ExportTimeout { timeout_ms: u64 },

    /// The export job reported a terminal status other than "complete".
    #[error("File creation status: {status}")]
    ExportFailed { status: String },

    #[error("Zip archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    // ============================================================================
    // Data-Shape Errors
    // ============================================================================
    /// No candidate matched the identifier during resolution. Never retried:
    /// this indicates a logic/data mismatch, not a transient condition.
    #[error("{kind}: {identifier} not found")]
    NotFound {
        kind: EntityKind,
        identifier: String,
    },

    /// Retrieved metadata or response data did not contain an expected shape.
    #[error("Unexpected data in Qualtrics response: {message}")]
    DataShape { message: String },

    #[error("Invalid identifier regex: {0}")]
    Regex(#[from] regex::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create a classified API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a data-shape error
    pub fn data_shape(message: impl Into<String>) -> Self {
        Self::DataShape {
            message: message.into(),
        }
    }

    /// Create a not-found error for a failed resolution
    pub fn not_found(kind: EntityKind, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            identifier: identifier.into(),
        }
    }

    /// Check if this error came from the server rather than local data handling
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Api { .. } | Error::HttpStatus { .. }
        )
    }
}

/// Result type alias for the Qualtrics client
pub type Result<T> = std::result::Result<T, Error>;
