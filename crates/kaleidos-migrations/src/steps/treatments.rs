//! Step 2: treatments for agenda items that have none.
//!
//! An agenda item can have several versions linked by `prov:wasRevisionOf`.
//! All versions of one logical item share a single treatment, so a bare item
//! either joins the treatment one of its versions already has, or gets a new
//! one that its untreated versions join as well.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use kaleidos_sparql::Row;
use tracing::{debug, warn};

use super::{MigrationStep, Scope};
use crate::MigrationError;
use crate::config::BatchSize;
use crate::context::MigrationContext;
use crate::driver::{BatchStep, run_to_exhaustion};
use crate::model::Treatment;
use crate::queries::{ListKind, Write};
use crate::report::StepReport;

/// Versions of one logical agenda item that need a treatment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemGroup {
    /// Bare items of the page first, then untreated versions outside it.
    pub subjects: Vec<String>,
    /// Smallest treatment IRI already used by a version of the group.
    pub existing_treatment: Option<String>,
}

impl ItemGroup {
    pub fn into_treatment(self) -> Treatment {
        match self.existing_treatment {
            Some(uri) => Treatment::existing(uri, self.subjects),
            None => Treatment::mint(self.subjects, None),
        }
    }
}

/// Group a page of bare items by logical item.
///
/// `versions` holds `?agendaItem ?version ?treatment` rows, as returned by the
/// versions query; `?treatment` is unbound for untreated versions. Rows for
/// items outside `items` are ignored.
pub fn plan_item_treatments(items: &[String], versions: &[Row]) -> Vec<ItemGroup> {
    let mut versions_of: BTreeMap<&str, BTreeSet<&str>> = items
        .iter()
        .map(|item| (item.as_str(), BTreeSet::new()))
        .collect();
    let mut treatments_of: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for row in versions {
        let (Some(item), Some(version)) = (row.uri("agendaItem"), row.uri("version")) else {
            warn!("skipping version row without agenda item or version");
            continue;
        };
        let Some(known) = versions_of.get_mut(item) else {
            continue;
        };
        known.insert(version);

        let treatments = treatments_of.entry(version).or_default();
        if let Some(treatment) = row.uri("treatment") {
            treatments.insert(treatment);
        }
    }

    // All versions of a logical item see the same version set, so its
    // smallest member identifies the group.
    let mut groups: BTreeMap<&str, (BTreeSet<&str>, BTreeSet<&str>)> = BTreeMap::new();
    for (&item, item_versions) in &versions_of {
        let key = item_versions
            .iter()
            .copied()
            .chain(std::iter::once(item))
            .min()
            .unwrap_or(item);
        let (members, all_versions) = groups.entry(key).or_default();
        members.insert(item);
        all_versions.extend(item_versions.iter().copied());
    }

    groups
        .into_values()
        .map(|(members, all_versions)| {
            let existing_treatment = all_versions
                .iter()
                .filter_map(|v| treatments_of.get(v))
                .flatten()
                .min()
                .map(|t| t.to_string());

            let mut subjects: Vec<String> = members.iter().map(|m| m.to_string()).collect();
            subjects.extend(
                all_versions
                    .iter()
                    .filter(|v| !members.contains(*v))
                    .filter(|v| treatments_of.get(*v).is_none_or(BTreeSet::is_empty))
                    .map(|v| v.to_string()),
            );

            ItemGroup {
                subjects,
                existing_treatment,
            }
        })
        .collect()
}

/// Gives every bare agenda item a treatment shared across its versions.
pub struct BareAgendaItemTreatments;

#[async_trait]
impl BatchStep for BareAgendaItemTreatments {
    fn name(&self) -> &'static str {
        "treatments-for-bare-agendaitems"
    }

    async fn list_page(
        &self,
        ctx: &MigrationContext,
        graph: &str,
        limit: BatchSize,
    ) -> Result<Vec<Row>, MigrationError> {
        let query = ctx
            .queries()
            .build_list_query(ListKind::BareAgendaItems, limit, graph)?;
        ctx.read(&query).await
    }

    async fn apply_page(
        &self,
        ctx: &MigrationContext,
        graph: &str,
        page: &[Row],
    ) -> Result<usize, MigrationError> {
        let items: Vec<String> = page
            .iter()
            .filter_map(|row| {
                let item = row.uri("agendaItem");
                if item.is_none() {
                    warn!("skipping agenda item row without an agendaItem binding");
                }
                item.map(str::to_string)
            })
            .collect();

        let versions = match ctx.queries().build_versions_query(graph, &items)? {
            Some(query) => ctx.read(&query).await?,
            None => Vec::new(),
        };

        let treatments: Vec<Treatment> = plan_item_treatments(&items, &versions)
            .into_iter()
            .map(ItemGroup::into_treatment)
            .collect();
        let reused = treatments.iter().filter(|t| !t.is_new()).count();
        debug!(
            items = items.len(),
            treatments = treatments.len(),
            reused,
            "planned treatments for bare agenda items"
        );

        if let Some(update) = ctx
            .queries()
            .build_write_query(graph, &Write::InsertTreatments(&treatments))?
        {
            ctx.write(&update).await?;
        }

        Ok(items.len())
    }
}

#[async_trait]
impl MigrationStep for BareAgendaItemTreatments {
    fn name(&self) -> &'static str {
        BatchStep::name(self)
    }

    fn description(&self) -> &'static str {
        "Give agenda items without a treatment one, shared with their other versions"
    }

    fn scope(&self) -> Scope {
        Scope::PrimaryGraph
    }

    #[tracing::instrument(
        skip_all,
        fields(step = "treatments-for-bare-agendaitems", graph = %graph)
    )]
    async fn run(&self, ctx: &MigrationContext, graph: &str) -> Result<StepReport, MigrationError> {
        run_to_exhaustion(self, ctx, ctx.config().batch_size, graph).await
    }
}
