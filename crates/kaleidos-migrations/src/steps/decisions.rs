//! Step 1: convert legacy decisions to treatments.

use std::collections::BTreeSet;

use async_trait::async_trait;
use kaleidos_sparql::Row;
use tracing::warn;

use super::{MigrationStep, Scope};
use crate::MigrationError;
use crate::config::BatchSize;
use crate::context::MigrationContext;
use crate::driver::{BatchStep, run_to_exhaustion};
use crate::model::Treatment;
use crate::queries::{ListKind, Write, join_updates};
use crate::report::StepReport;

/// Mints one treatment per decision and moves the decision's agenda items,
/// report and newsletter info onto it.
///
/// Pages hold decisions only. The agenda items that reference a decision are
/// bound by the store inside the linking update, so a decision is linked to
/// all of them no matter how many there are.
pub struct DecisionsToTreatments;

/// Distinct decisions of a page, in IRI order.
fn page_decisions(page: &[Row]) -> BTreeSet<String> {
    page.iter()
        .filter_map(|row| {
            let decision = row.uri("decision");
            if decision.is_none() {
                warn!("skipping decision row without a decision binding");
            }
            decision.map(str::to_string)
        })
        .collect()
}

#[async_trait]
impl BatchStep for DecisionsToTreatments {
    fn name(&self) -> &'static str {
        "decisions-to-treatments"
    }

    async fn list_page(
        &self,
        ctx: &MigrationContext,
        graph: &str,
        limit: BatchSize,
    ) -> Result<Vec<Row>, MigrationError> {
        let query = ctx
            .queries()
            .build_list_query(ListKind::Decisions, limit, graph)?;
        ctx.read(&query).await
    }

    async fn apply_page(
        &self,
        ctx: &MigrationContext,
        graph: &str,
        page: &[Row],
    ) -> Result<usize, MigrationError> {
        let decisions: Vec<String> = page_decisions(page).into_iter().collect();
        let treatments: Vec<Treatment> = decisions
            .iter()
            .map(|decision| Treatment::mint(Vec::new(), Some(decision.clone())))
            .collect();

        // Linking matches on prov:wasDerivedFrom, so it must follow the insert
        let queries = ctx.queries();
        let update = join_updates([
            queries.build_write_query(graph, &Write::InsertTreatments(&treatments))?,
            queries.build_write_query(graph, &Write::LinkDecisionResources(&decisions))?,
        ]);
        if let Some(update) = update {
            ctx.write(&update).await?;
        }

        Ok(treatments.len())
    }
}

#[async_trait]
impl MigrationStep for DecisionsToTreatments {
    fn name(&self) -> &'static str {
        BatchStep::name(self)
    }

    fn description(&self) -> &'static str {
        "Mint a treatment per decision and link its agenda items, report and newsletter info"
    }

    fn scope(&self) -> Scope {
        Scope::AllGraphs
    }

    #[tracing::instrument(skip_all, fields(step = "decisions-to-treatments", graph = %graph))]
    async fn run(&self, ctx: &MigrationContext, graph: &str) -> Result<StepReport, MigrationError> {
        run_to_exhaustion(self, ctx, ctx.config().batch_size, graph).await
    }
}
