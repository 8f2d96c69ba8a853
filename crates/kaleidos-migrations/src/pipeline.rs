//! The ordered migration pipeline.

use chrono::Utc;
use tracing::info;

use crate::context::MigrationContext;
use crate::report::{PipelineReport, StepReport};
use crate::steps::{
    BareAgendaItemTreatments, DecisionsToTreatments, GlobalUpdate, MigrationStep, Scope,
    SynthesizeNewsletterInfos,
};
use crate::{ConfigError, MigrationError};

/// Steps in the order they must run.
///
/// Later steps read what earlier steps wrote: subcases are attached to the
/// treatments of steps 1 and 2, and newsletter infos are linked through those
/// subcases.
pub struct Pipeline {
    steps: Vec<Box<dyn MigrationStep>>,
}

impl Pipeline {
    /// The full migration.
    pub fn standard() -> Self {
        Self {
            steps: vec![
                Box::new(DecisionsToTreatments),
                Box::new(BareAgendaItemTreatments),
                Box::new(GlobalUpdate::attach_subcases()),
                Box::new(GlobalUpdate::link_newsletter_infos()),
                Box::new(SynthesizeNewsletterInfos),
                Box::new(GlobalUpdate::normalize_result_codes()),
                Box::new(GlobalUpdate::normalize_decision_dates()),
            ],
        }
    }

    /// Name and description of each step, in order.
    pub fn steps(&self) -> Vec<(&'static str, &'static str)> {
        self.steps
            .iter()
            .map(|s| (s.name(), s.description()))
            .collect()
    }

    /// Run every step to completion.
    pub async fn run(&self, ctx: &MigrationContext) -> Result<PipelineReport, MigrationError> {
        let started_at = Utc::now();
        let mut reports = Vec::new();

        for step in &self.steps {
            reports.extend(run_step(step.as_ref(), ctx).await?);
        }

        let report = PipelineReport {
            started_at,
            finished_at: Utc::now(),
            steps: reports,
        };
        info!(
            records = report.records(),
            batches = report.batches(),
            "migration finished"
        );
        Ok(report)
    }

    /// Run the single step called `name`.
    pub async fn run_only(
        &self,
        ctx: &MigrationContext,
        name: &str,
    ) -> Result<PipelineReport, MigrationError> {
        let step = self
            .steps
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| ConfigError::UnknownStep(name.to_string()))?;

        let started_at = Utc::now();
        let steps = run_step(step.as_ref(), ctx).await?;
        Ok(PipelineReport {
            started_at,
            finished_at: Utc::now(),
            steps,
        })
    }
}

async fn run_step(
    step: &dyn MigrationStep,
    ctx: &MigrationContext,
) -> Result<Vec<StepReport>, MigrationError> {
    let config = ctx.config();
    let graphs: Vec<&str> = match step.scope() {
        Scope::AllGraphs => config.graphs.iter().map(String::as_str).collect(),
        Scope::PrimaryGraph => vec![config.primary_graph.as_str()],
    };

    let mut reports = Vec::with_capacity(graphs.len());
    for graph in graphs {
        info!(step = step.name(), graph = %graph, "starting step");
        let report = step.run(ctx, graph).await?;
        info!(
            step = step.name(),
            graph = %graph,
            batches = report.batches,
            records = report.records,
            "step complete"
        );
        reports.push(report);
    }
    Ok(reports)
}
