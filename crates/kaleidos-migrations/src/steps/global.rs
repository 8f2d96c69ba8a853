//! Steps that run as one update against the primary graph.

use async_trait::async_trait;
use tracing::info;

use super::{MigrationStep, Scope};
use crate::MigrationError;
use crate::context::MigrationContext;
use crate::queries::Write;
use crate::report::StepReport;

/// A step whose whole effect is a single graph-wide update.
///
/// The update's `WHERE` clause filters out already converted data, so running
/// it again is harmless.
pub struct GlobalUpdate {
    name: &'static str,
    description: &'static str,
    write: Write<'static>,
}

impl GlobalUpdate {
    pub fn attach_subcases() -> Self {
        Self {
            name: "attach-treatments-to-subcases",
            description: "Attach each treatment to the subcase its agenda item came from",
            write: Write::AttachSubcases,
        }
    }

    pub fn link_newsletter_infos() -> Self {
        Self {
            name: "link-legacy-newsletter-infos",
            description: "Link legacy newsletter infos of a subcase to its treatments",
            write: Write::LinkNewsletterInfos,
        }
    }

    pub fn normalize_result_codes() -> Self {
        Self {
            name: "normalize-result-codes",
            description: "Replace the decision approval boolean by a result code on the treatment",
            write: Write::NormalizeResultCodes,
        }
    }

    pub fn normalize_decision_dates() -> Self {
        Self {
            name: "normalize-decision-dates",
            description: "Rewrite decision dates typed xsd:date as xsd:dateTime",
            write: Write::NormalizeDecisionDates,
        }
    }
}

#[async_trait]
impl MigrationStep for GlobalUpdate {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn scope(&self) -> Scope {
        Scope::PrimaryGraph
    }

    #[tracing::instrument(skip_all, fields(step = self.name, graph = %graph))]
    async fn run(&self, ctx: &MigrationContext, graph: &str) -> Result<StepReport, MigrationError> {
        let mut report = StepReport::new(self.name, graph);
        if let Some(update) = ctx.queries().build_write_query(graph, &self.write)? {
            info!(step = self.name, graph = %graph, "running update");
            ctx.write(&update).await?;
            report.batches = 1;
        }
        Ok(report)
    }
}
