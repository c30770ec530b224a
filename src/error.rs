//! Error types for the PagerDuty tap
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use std::time::Duration;
use thiserror::Error;

/// The main error type for the tap
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("/{stream} endpoint does not support '{param}' parameter")]
    UnknownParameter { stream: String, param: String },

    #[error("Parameter '{param}' required but not supplied for /{stream} endpoint")]
    MissingParameter { stream: String, param: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Gave up after {attempts} attempts in {elapsed:?}: {last}")]
    RetriesExhausted {
        attempts: u32,
        elapsed: Duration,
        last: Box<Error>,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    // ============================================================================
    // Schema Errors
    // ============================================================================
    #[error("No schema found for stream '{stream}'")]
    SchemaNotFound { stream: String },

    #[error("Record in '{stream}' does not match schema at '{path}': {message}")]
    SchemaMismatch {
        stream: String,
        path: String,
        message: String,
    },

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // Sync Errors
    // ============================================================================
    #[error("Stream '{stream}' not found")]
    StreamNotFound { stream: String },

    #[error("Sync of stream '{stream}' failed: {source}")]
    StreamFailed {
        stream: String,
        #[source]
        source: Box<Error>,
    },

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

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a schema mismatch error
    pub fn schema_mismatch(
        stream: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SchemaMismatch {
            stream: stream.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Wrap an error as the terminal failure of a stream
    pub fn stream_failed(stream: impl Into<String>, source: Error) -> Self {
        Self::StreamFailed {
            stream: stream.into(),
            source: Box::new(source),
        }
    }

    /// Check if this error is a pre-flight configuration problem
    pub fn is_config(&self) -> bool {
        match self {
            Error::Config { .. }
            | Error::MissingConfigField { .. }
            | Error::InvalidConfigValue { .. }
            | Error::UnknownParameter { .. }
            | Error::MissingParameter { .. } => true,
            Error::StreamFailed { source, .. } => source.is_config(),
            _ => false,
        }
    }

    /// Check if this error is retryable
    ///
    /// Transport failures (connect, timeout, send, body read) are always
    /// retryable. A body that arrived intact but does not parse is a
    /// `MalformedResponse` and is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() || e.is_decode()
            }
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            Error::RetriesExhausted { last, .. } => last.status(),
            Error::StreamFailed { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// Check if an HTTP status code is retryable (429 or any 5xx)
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Result type alias for the tap
pub type Result<T> = std::result::Result<T, Error>;
