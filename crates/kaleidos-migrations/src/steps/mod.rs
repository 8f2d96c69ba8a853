//! The migration steps, in pipeline order.

mod decisions;
mod global;
mod newsletter;
mod treatments;

use async_trait::async_trait;

use crate::MigrationError;
use crate::context::MigrationContext;
use crate::report::StepReport;

pub use decisions::DecisionsToTreatments;
pub use global::GlobalUpdate;
pub use newsletter::SynthesizeNewsletterInfos;
pub use treatments::{BareAgendaItemTreatments, ItemGroup, plan_item_treatments};

/// Which graphs a step runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every configured graph, in order.
    AllGraphs,
    /// The primary graph only.
    PrimaryGraph,
}

/// One named step of the migration.
#[async_trait]
pub trait MigrationStep: Send + Sync {
    /// Unique name for this step.
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    fn scope(&self) -> Scope;

    /// Run the step against `graph` until it has nothing left to convert.
    async fn run(&self, ctx: &MigrationContext, graph: &str) -> Result<StepReport, MigrationError>;
}
