//! Error types for the migration.

use std::path::PathBuf;

use kaleidos_sparql::{InvalidIri, StoreError};
use thiserror::Error;

/// Problems with the migration's configuration or query templates.
///
/// These are detected before any store access and abort the run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A query template could not be read.
    #[error("missing query template {key} at {}: {source}", path.display())]
    MissingTemplate {
        key: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template lacks a placeholder its query needs.
    #[error("query template {key} is missing placeholder `{placeholder}`")]
    MissingPlaceholder {
        key: &'static str,
        placeholder: &'static str,
    },

    /// A template contains a placeholder nothing would substitute.
    #[error("query template {key} contains unknown or malformed placeholder `{token}`")]
    UnknownPlaceholder { key: &'static str, token: String },

    /// Batch size is not a positive integer.
    #[error("invalid batch size '{0}': expected a positive integer")]
    InvalidBatchSize(String),

    /// Unknown treatment vocabulary name.
    #[error("unknown treatment vocabulary '{0}', expected 'besluit' or 'besluitvorming'")]
    UnknownVocabulary(String),

    /// No step with this name exists.
    #[error("unknown migration step: {0}")]
    UnknownStep(String),
}

/// Errors that abort a migration run.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Store read or write failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A graph or resource IRI cannot be written into a query.
    #[error("cannot render query: {0}")]
    Query(#[from] InvalidIri),
}
