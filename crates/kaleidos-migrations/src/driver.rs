//! Batch pagination driver.
//!
//! Paginated steps never use offsets. Each page is read with the step's list
//! query, which excludes already converted entities, so converting a page
//! shrinks the candidate set and the next read returns fresh work.

use async_trait::async_trait;
use kaleidos_sparql::Row;
use tracing::info;

use crate::MigrationError;
use crate::config::BatchSize;
use crate::context::MigrationContext;
use crate::report::StepReport;

/// A step that converts its candidates one page at a time.
#[async_trait]
pub trait BatchStep: Send + Sync {
    fn name(&self) -> &'static str;

    /// Read up to `limit` unconverted candidates from `graph`.
    async fn list_page(
        &self,
        ctx: &MigrationContext,
        graph: &str,
        limit: BatchSize,
    ) -> Result<Vec<Row>, MigrationError>;

    /// Convert a non-empty page; returns the number of entities converted.
    async fn apply_page(
        &self,
        ctx: &MigrationContext,
        graph: &str,
        page: &[Row],
    ) -> Result<usize, MigrationError>;
}

/// Run `step` on `graph` until a page comes back short.
///
/// For `T` candidates this issues `T / B + 1` reads and `ceil(T / B)` writes.
/// Any store failure aborts immediately.
pub async fn run_to_exhaustion(
    step: &dyn BatchStep,
    ctx: &MigrationContext,
    batch_size: BatchSize,
    graph: &str,
) -> Result<StepReport, MigrationError> {
    let mut report = StepReport::new(step.name(), graph);

    loop {
        let batch = report.batches + 1;
        info!(step = step.name(), graph = %graph, batch, "running batch");

        let page = step.list_page(ctx, graph, batch_size).await?;
        if !page.is_empty() {
            report.records += step.apply_page(ctx, graph, &page).await?;
            report.batches += 1;
        }

        if page.len() < batch_size.get() {
            break;
        }
    }

    Ok(report)
}
