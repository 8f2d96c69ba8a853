//! The store abstraction the migration steps are written against.

use async_trait::async_trait;

use crate::{Row, StoreError};

/// Something that can run SPARQL reads and updates.
///
/// [`crate::SparqlClient`] talks to a real endpoint; tests use in-memory
/// implementations.
#[async_trait]
pub trait TripleStore: Send + Sync {
    /// Run a SELECT query and return its solutions.
    async fn execute_read(&self, query: &str) -> Result<Vec<Row>, StoreError>;

    /// Run a SPARQL update.
    async fn execute_write(&self, update: &str) -> Result<(), StoreError>;
}
