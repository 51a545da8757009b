//! Error types
//!
//! Typed errors for the failure classes callers may want to tell apart.
//! Everything else travels as `anyhow::Error` with context attached.

use reqwest::StatusCode;

/// A declarative attribute failed validation before any request was made
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for {attribute}: {message}")]
pub struct ValidationError {
    pub attribute: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            message: message.into(),
        }
    }
}

/// An import identifier did not have the `project_key:name` shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unexpected format of ID ({id}), expected project_key:name")]
pub struct ImportIdError {
    pub id: String,
}

/// The Access API answered with a non-success status
#[derive(Debug, Clone, thiserror::Error)]
#[error("API request failed: {method} {url} returned {status}")]
pub struct ApiError {
    pub method: &'static str,
    pub url: String,
    pub status: StatusCode,
}

/// Status code of an [`ApiError`] buried in an `anyhow` chain, if any
pub fn api_status(error: &anyhow::Error) -> Option<StatusCode> {
    error.chain().find_map(|cause| {
        cause
            .downcast_ref::<ApiError>()
            .map(|api_error| api_error.status)
    })
}
