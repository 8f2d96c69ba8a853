//! Shared state handed to every step.

use std::sync::Arc;

use kaleidos_sparql::{Row, TripleStore};
use tracing::debug;

use crate::MigrationError;
use crate::config::MigrationConfig;
use crate::queries::QueryBuilder;

/// Store, query builder and configuration for one run.
#[derive(Clone)]
pub struct MigrationContext {
    store: Arc<dyn TripleStore>,
    queries: QueryBuilder,
    config: MigrationConfig,
}

impl MigrationContext {
    pub fn new(
        store: Arc<dyn TripleStore>,
        queries: QueryBuilder,
        config: MigrationConfig,
    ) -> Self {
        Self {
            store,
            queries,
            config,
        }
    }

    pub fn queries(&self) -> &QueryBuilder {
        &self.queries
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Execute a SELECT against the store.
    pub async fn read(&self, query: &str) -> Result<Vec<Row>, MigrationError> {
        debug!(query = %query, "executing read");
        Ok(self.store.execute_read(query).await?)
    }

    /// Execute an update against the store.
    pub async fn write(&self, update: &str) -> Result<(), MigrationError> {
        debug!(update = %update, "executing write");
        Ok(self.store.execute_write(update).await?)
    }
}
