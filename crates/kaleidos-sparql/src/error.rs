//! Error types for the SPARQL client.

use thiserror::Error;

/// Errors that can occur when talking to the triple store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization of a result document failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The endpoint answered with a non-success status.
    #[error("SPARQL endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },

    /// Invalid response from the endpoint.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build SPARQL client: {0}")]
    Client(String),
}

impl StoreError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Http(e) => e.is_timeout() || e.is_connect(),
            StoreError::Endpoint { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// An IRI that cannot be written as a SPARQL `IRIREF`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid IRI {iri:?}: {ch:?} is not allowed in an IRI reference")]
pub struct InvalidIri {
    pub iri: String,
    pub ch: char,
}
