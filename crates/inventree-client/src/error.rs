//! InvenTree client errors

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Structured detail attached to a failed HTTP request.
///
/// Carries enough context for a caller to log the failure or branch on the
/// status code (e.g. to tell "not found" apart from "forbidden").
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HttpErrorDetail {
    /// Human readable summary
    pub detail: String,
    /// Fully qualified request URL (without query string)
    pub url: String,
    /// HTTP verb
    pub method: String,
    /// Status code returned by the server
    pub status_code: u16,
    /// Raw response body
    pub body: String,
    /// Query parameters sent with the request
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<(String, String)>,
    /// JSON payload sent with the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Names of any uploaded files
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

impl std::fmt::Display for HttpErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {} {} returned {}: {}",
            self.detail, self.method, self.url, self.status_code, self.body
        )
    }
}

/// Errors that can occur when interacting with the InvenTree API
#[derive(Debug, Error)]
pub enum InvenTreeError {
    /// Low level HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server could not be reached
    #[error("Could not connect to InvenTree server at {url}: {reason}")]
    Connection {
        /// URL that was requested
        url: String,
        /// Underlying cause
        reason: String,
    },

    /// The request did not complete within the configured timeout
    #[error("Server timed out during {method} {url} (timeout {timeout:?})")]
    Timeout {
        /// URL that was requested
        url: String,
        /// HTTP verb
        method: String,
        /// Timeout that elapsed
        timeout: Duration,
    },

    /// The server answered with a status code of 300 or above
    #[error("API error: {0}")]
    Api(Box<HttpErrorDetail>),

    /// A read request answered with something other than JSON
    #[error("Response content-type is not JSON - '{url}' - '{content_type}'")]
    ContentType {
        /// URL that was requested
        url: String,
        /// Content type reported by the server
        content_type: String,
    },

    /// Response body could not be decoded
    #[error("Error decoding JSON response - '{url}': {source}")]
    InvalidJson {
        /// URL that was requested
        url: String,
        /// Decoder error
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Credentials missing or rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Server reported an api version below the supported floor
    #[error(
        "Server API version ({found}) is older than minimum supported API version ({required})"
    )]
    IncompatibleServer {
        /// Version reported by the server
        found: u32,
        /// Minimum version this client accepts
        required: u32,
    },

    /// Server reported an api version that is not an integer
    #[error("Server returned invalid API version: '{0}'")]
    InvalidApiVersion(String),

    /// Model type is not available on the connected server version
    #[error("Server API version ({api_version}) is not supported by the '{model}' class: {requirement}")]
    UnsupportedModel {
        /// Model name
        model: &'static str,
        /// Version reported by the server
        api_version: u32,
        /// Version window the model requires
        requirement: String,
    },

    /// Primary key could not be coerced to the declared key type
    #[error("Invalid primary key value '{value}' for {model}")]
    InvalidPrimaryKey {
        /// Model name
        model: &'static str,
        /// Offending value
        value: String,
    },

    /// Integer primary key was zero or negative
    #[error("Supplied <pk> value ({value}) for {model} must be positive")]
    NonPositivePrimaryKey {
        /// Model name
        model: &'static str,
        /// Offending value
        value: i64,
    },

    /// Neither a primary key nor a populated record was supplied
    #[error("No primary key available for {0}")]
    MissingPrimaryKey(&'static str),

    /// Field lookup on a record failed
    #[error("Key '{0}' does not exist in dataset")]
    KeyNotFound(String),

    /// Status transition outside the supported vocabulary
    #[error("Order status '{0}' not supported")]
    InvalidStatus(String),

    /// Invalid argument supplied to a client operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Download destination already exists
    #[error("Destination file '{}' already exists", .0.display())]
    FileExists(PathBuf),

    /// Local file to upload does not exist
    #[error("File does not exist: '{}'", .0.display())]
    FileNotFound(PathBuf),

    /// Local filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InvenTreeError {
    /// Status code of a failed HTTP request, if this error came from one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(detail) => Some(detail.status_code),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Structured detail of a failed HTTP request
    pub fn detail(&self) -> Option<&HttpErrorDetail> {
        match self {
            Self::Api(detail) => Some(detail.as_ref()),
            _ => None,
        }
    }

    /// True when the server answered 404
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// True when the request timed out
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}
