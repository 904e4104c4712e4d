//! Error types for a single collection run

use std::fmt;
use thiserror::Error;

/// Result type for collection operations
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort a collection run.
///
/// None of these are retried; the first one raised ends the invocation.
#[derive(Error, Debug)]
pub enum Error {
    /// A required configuration field is empty
    #[error("No {field} provided")]
    MissingConfig { field: &'static str },

    /// The configuration event could not be parsed
    #[error("Configuration error: {0}")]
    ConfigParse(String),

    /// Transport failure while querying the Buildkite API
    #[error("Failed to request {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The Buildkite API answered with something other than 200 OK
    #[error("Failed to request {url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The Buildkite API response body was not a list of builds
    #[error("Failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    /// A batch of metric data was rejected by the metrics backend
    #[error("Failed to submit {count} metrics to namespace {namespace}: {reason}")]
    Submission {
        namespace: String,
        count: usize,
        reason: String,
    },

    /// Reading the configuration event failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a missing configuration error
    pub fn missing_config(field: &'static str) -> Self {
        Self::MissingConfig { field }
    }

    /// Create a configuration parse error
    pub fn config_parse<E: fmt::Display>(err: E) -> Self {
        Self::ConfigParse(err.to_string())
    }

    /// Create a transport error for a Buildkite request
    pub fn fetch<E: fmt::Display>(url: impl Into<String>, err: E) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: err.to_string(),
        }
    }

    /// Create a non-200 status error for a Buildkite request
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Create a response decoding error for a Buildkite request
    pub fn decode<E: fmt::Display>(url: impl Into<String>, err: E) -> Self {
        Self::Decode {
            url: url.into(),
            reason: err.to_string(),
        }
    }

    /// Create a metrics submission error
    pub fn submission<E: fmt::Display>(namespace: impl Into<String>, count: usize, err: E) -> Self {
        Self::Submission {
            namespace: namespace.into(),
            count,
            reason: err.to_string(),
        }
    }

    /// Check if this error came from configuration validation or parsing
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::MissingConfig { .. } | Self::ConfigParse(_))
    }

    /// Check if this error came from querying Buildkite
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::HttpStatus { .. } | Self::Decode { .. }
        )
    }

    /// Check if this error came from submitting metrics
    pub fn is_submission_error(&self) -> bool {
        matches!(self, Self::Submission { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::config_parse(err)
    }
}
