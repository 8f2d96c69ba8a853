//! Renders queries and updates from templates and typed parameters.

use kaleidos_sparql::{InvalidIri, escape_bool, escape_string, escape_uri, join_uris};

use crate::config::{BatchSize, SchemaVersion};
use crate::model::{NewsletterInfo, Treatment};
use crate::templates::{Placeholder, TemplateKey, TemplateRegistry, substitute};
use crate::vocab;

/// Entities listed by the paginated steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// Decisions no treatment has been derived from.
    Decisions,
    /// Agenda items that are no treatment's subject.
    BareAgendaItems,
}

/// A write operation and its parameters.
#[derive(Debug, Clone, Copy)]
pub enum Write<'a> {
    InsertTreatments(&'a [Treatment]),
    /// Converted decisions whose agenda items, report and newsletter info
    /// move to their treatment.
    LinkDecisionResources(&'a [String]),
    AttachSubcases,
    LinkNewsletterInfos,
    InsertNewsletterInfo(&'a NewsletterInfo),
    NormalizeResultCodes,
    NormalizeDecisionDates,
}

impl Write<'_> {
    fn template(&self) -> TemplateKey {
        match self {
            Write::InsertTreatments(_) => TemplateKey::InsertTreatments,
            Write::LinkDecisionResources(_) => TemplateKey::LinkDecisionResources,
            Write::AttachSubcases => TemplateKey::AttachSubcases,
            Write::LinkNewsletterInfos => TemplateKey::LinkNewsletterInfos,
            Write::InsertNewsletterInfo(_) => TemplateKey::InsertNewsletterInfo,
            Write::NormalizeResultCodes => TemplateKey::NormalizeResultCodes,
            Write::NormalizeDecisionDates => TemplateKey::NormalizeDecisionDates,
        }
    }
}

/// Deterministic query rendering over a validated template registry.
///
/// Rendering fails only when an IRI cannot be written as an `IRIREF`.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    templates: TemplateRegistry,
    treatment_type: &'static str,
}

impl QueryBuilder {
    pub fn new(templates: TemplateRegistry, schema: &SchemaVersion) -> Self {
        Self {
            templates,
            treatment_type: schema.treatment_vocabulary.type_uri(),
        }
    }

    /// Render `key`, prefixed with a comment naming the template.
    fn render(
        &self,
        key: TemplateKey,
        graph: &str,
        values: &[(Placeholder, &str)],
    ) -> Result<String, InvalidIri> {
        let graph = escape_uri(graph)?;
        let treatment_type = escape_uri(self.treatment_type)?;
        let mut all = Vec::with_capacity(values.len() + 2);
        all.push((Placeholder::Graph, graph.as_str()));
        all.push((Placeholder::TreatmentType, treatment_type.as_str()));
        all.extend_from_slice(values);

        Ok(format!(
            "# {}\n{}",
            key.name(),
            substitute(self.templates.get(key), &all)
        ))
    }

    /// Up to `limit` unconverted entities of `kind`, ordered by IRI.
    pub fn build_list_query(
        &self,
        kind: ListKind,
        limit: BatchSize,
        graph: &str,
    ) -> Result<String, InvalidIri> {
        let key = match kind {
            ListKind::Decisions => TemplateKey::ListDecisions,
            ListKind::BareAgendaItems => TemplateKey::ListBareAgendaItems,
        };
        let limit = limit.to_string();
        self.render(key, graph, &[(Placeholder::Limit, limit.as_str())])
    }

    /// Other versions of `items` with their existing treatment, if any.
    pub fn build_versions_query(
        &self,
        graph: &str,
        items: &[String],
    ) -> Result<Option<String>, InvalidIri> {
        if items.is_empty() {
            return Ok(None);
        }
        let values = values_block(items)?;
        self.render(
            TemplateKey::ListAgendaItemVersions,
            graph,
            &[(Placeholder::Values, values.as_str())],
        )
        .map(Some)
    }

    pub fn build_announcements_query(&self, graph: &str) -> Result<String, InvalidIri> {
        self.render(TemplateKey::ListAnnouncementsWithoutNewsletterInfo, graph, &[])
    }

    pub fn build_metadata_query(&self, graph: &str, item: &str) -> Result<String, InvalidIri> {
        let subject = escape_uri(item)?;
        self.render(
            TemplateKey::AnnouncementMetadata,
            graph,
            &[(Placeholder::Subject, subject.as_str())],
        )
    }

    /// Update for `write`, or `None` when there is nothing to write.
    pub fn build_write_query(
        &self,
        graph: &str,
        write: &Write<'_>,
    ) -> Result<Option<String>, InvalidIri> {
        let key = write.template();
        let rendered = match write {
            Write::InsertTreatments(treatments) => {
                if treatments.is_empty() {
                    return Ok(None);
                }
                let treatment_type = escape_uri(self.treatment_type)?;
                let triples = treatment_triples(treatments, &treatment_type)?;
                self.render(key, graph, &[(Placeholder::Triples, triples.as_str())])?
            }
            Write::LinkDecisionResources(decisions) => {
                if decisions.is_empty() {
                    return Ok(None);
                }
                let values = values_block(decisions)?;
                self.render(key, graph, &[(Placeholder::Values, values.as_str())])?
            }
            Write::InsertNewsletterInfo(info) => {
                let triples = newsletter_info_triples(info)?;
                self.render(key, graph, &[(Placeholder::Triples, triples.as_str())])?
            }
            Write::AttachSubcases
            | Write::LinkNewsletterInfos
            | Write::NormalizeResultCodes
            | Write::NormalizeDecisionDates => self.render(key, graph, &[])?,
        };
        Ok(Some(rendered))
    }
}

/// Join several updates into one request, skipping the empty ones.
pub fn join_updates(updates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    let updates: Vec<String> = updates.into_iter().flatten().collect();
    if updates.is_empty() {
        None
    } else {
        Some(updates.join(" ;\n"))
    }
}

fn values_block(uris: &[String]) -> Result<String, InvalidIri> {
    join_uris(uris, "\n      ")
}

fn triple(subject: &str, predicate: &str, object: String) -> Result<String, InvalidIri> {
    Ok(format!(
        "{} {} {} .",
        escape_uri(subject)?,
        escape_uri(predicate)?,
        object
    ))
}

fn treatment_triples(treatments: &[Treatment], treatment_type: &str) -> Result<String, InvalidIri> {
    let mut triples = Vec::new();
    for treatment in treatments {
        if let Some(uuid) = &treatment.uuid {
            triples.push(triple(
                &treatment.uri,
                vocab::RDF_TYPE,
                treatment_type.to_string(),
            )?);
            triples.push(triple(&treatment.uri, vocab::MU_UUID, escape_string(uuid))?);
        }
        for subject in &treatment.subjects {
            triples.push(triple(&treatment.uri, vocab::DCT_SUBJECT, escape_uri(subject)?)?);
        }
        if let Some(decision) = &treatment.derived_from {
            triples.push(triple(
                &treatment.uri,
                vocab::PROV_WAS_DERIVED_FROM,
                escape_uri(decision)?,
            )?);
        }
    }
    Ok(triples.join("\n    "))
}

fn newsletter_info_triples(info: &NewsletterInfo) -> Result<String, InvalidIri> {
    let mut triples = vec![
        triple(&info.uri, vocab::RDF_TYPE, escape_uri(vocab::NEWSLETTER_INFO)?)?,
        triple(&info.uri, vocab::MU_UUID, escape_string(&info.uuid))?,
        triple(&info.uri, vocab::DCT_TITLE, escape_string(&info.title))?,
        triple(&info.uri, vocab::EXT_HTML_CONTENT, escape_string(&info.content))?,
    ];
    if let Some(flag) = info.in_newsletter {
        triples.push(triple(&info.uri, vocab::EXT_IN_NEWSLETTER, escape_bool(flag))?);
    }
    triples.push(triple(
        &info.treatment,
        vocab::PROV_GENERATED,
        escape_uri(&info.uri)?,
    )?);
    Ok(triples.join("\n    "))
}
