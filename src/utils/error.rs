//! Error types and handling
//!
//! Every failure the client can report is a [`CaError`]. Each variant carries
//! enough context (HTTP method and URL, certificate name, or what was being
//! decoded) to diagnose a failure without a network capture. Nothing in this
//! crate retries; the caller decides what to do with each kind.

use reqwest::{Method, StatusCode};
use thiserror::Error;

use crate::models::pson::CodecError;

/// Puppet CA client error types
#[derive(Debug, Error)]
pub enum CaError {
    /// Malformed TLS material or inconsistent file/inline pairing
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request could not be assembled (bad URL, header or body)
    #[error("Failed to build request: {0}")]
    Build(String),

    /// Network, TLS or body read failure
    #[error("Failed to {method} URL {url}: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The CA answered with a status other than 200 or 204
    #[error("Failed to {method} URL {url}, got: {status}")]
    HttpStatus {
        method: Method,
        url: String,
        status: StatusCode,
    },

    /// The CA reported that nothing matched the request
    #[error("Not found: {0}")]
    NotFound(String),

    /// Text could not be converted to or from the CA's character set
    #[error("Charset error: {0}")]
    Codec(#[from] CodecError),

    /// A successful response body could not be decoded
    #[error("Failed to decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CaError {
    /// Wrap a JSON decoding failure with what was being decoded
    pub fn decode(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        CaError::Decode {
            context: context.into(),
            source: source.into(),
        }
    }

    /// HTTP status returned by the CA, for [`CaError::HttpStatus`] only
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CaError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the CA reported that there was nothing to act on
    pub fn is_not_found(&self) -> bool {
        matches!(self, CaError::NotFound(_))
    }
}

/// Result type alias for CA operations
pub type CaResult<T> = Result<T, CaError>;
