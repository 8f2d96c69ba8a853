//! Step 5: newsletter infos for announcements.

use std::collections::BTreeMap;

use async_trait::async_trait;
use kaleidos_sparql::Row;
use tracing::{info, warn};

use super::{MigrationStep, Scope};
use crate::MigrationError;
use crate::context::MigrationContext;
use crate::model::{AnnouncementMetadata, NewsletterInfo};
use crate::queries::Write;
use crate::report::StepReport;

/// Synthesizes a newsletter info for every announcement whose treatment has
/// none, from the announcement's title and short title.
///
/// The candidate list is read once. The insert for each candidate is
/// unconditional, so two overlapping runs can both insert an info for the
/// same treatment.
pub struct SynthesizeNewsletterInfos;

/// One announcement per treatment, keyed by treatment IRI.
fn candidates(rows: &[Row]) -> BTreeMap<String, String> {
    let mut by_treatment = BTreeMap::new();
    for row in rows {
        let (Some(item), Some(treatment)) = (row.uri("agendaItem"), row.uri("treatment")) else {
            warn!("skipping announcement row without agenda item or treatment");
            continue;
        };
        by_treatment
            .entry(treatment.to_string())
            .or_insert_with(|| item.to_string());
    }
    by_treatment
}

#[async_trait]
impl MigrationStep for SynthesizeNewsletterInfos {
    fn name(&self) -> &'static str {
        "synthesize-newsletter-infos"
    }

    fn description(&self) -> &'static str {
        "Create newsletter infos for announcements from their title and short title"
    }

    fn scope(&self) -> Scope {
        Scope::PrimaryGraph
    }

    #[tracing::instrument(skip_all, fields(step = "synthesize-newsletter-infos", graph = %graph))]
    async fn run(&self, ctx: &MigrationContext, graph: &str) -> Result<StepReport, MigrationError> {
        let mut report = StepReport::new(self.name(), graph);
        let flag = ctx.config().schema.newsletter_inclusion_flag;

        let rows = ctx
            .read(&ctx.queries().build_announcements_query(graph)?)
            .await?;
        let candidates = candidates(&rows);
        info!(
            step = self.name(),
            graph = %graph,
            announcements = candidates.len(),
            "synthesizing newsletter infos"
        );

        for (treatment, item) in &candidates {
            let metadata_rows = ctx
                .read(&ctx.queries().build_metadata_query(graph, item)?)
                .await?;
            let metadata = AnnouncementMetadata::from_row(metadata_rows.first());
            if metadata.title.is_none() {
                warn!(agenda_item = %item, "announcement has no title, using empty strings");
            }

            let info = NewsletterInfo::synthesize(treatment, &metadata, flag);
            if let Some(update) = ctx
                .queries()
                .build_write_query(graph, &Write::InsertNewsletterInfo(&info))?
            {
                ctx.write(&update).await?;
                report.batches += 1;
                report.records += 1;
            }
        }

        Ok(report)
    }
}
