//! In-memory triple store that understands the migration's own queries.
//!
//! Queries are dispatched on their leading `# <template>` line and evaluated
//! against a small object model rather than a real RDF graph.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kaleidos_migrations::config::GRAPHS;
use kaleidos_migrations::{
    BatchSize, MigrationConfig, MigrationContext, QueryBuilder, SchemaVersion, TemplateRegistry,
    vocab,
};
use kaleidos_sparql::{Row, StoreError, TripleStore};
use regex::Regex;

pub const KANSELARIJ: &str = GRAPHS[0];
pub const MINISTER: &str = GRAPHS[1];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decision {
    /// Agenda items that reference this decision, one per version.
    pub agenda_items: Vec<String>,
    pub report: Option<String>,
    pub newsletter_info: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreatmentRecord {
    pub graph: String,
    pub typed: bool,
    pub uuid: Option<String>,
    pub subjects: BTreeSet<String>,
    pub derived_from: Option<String>,
    pub subcase: Option<String>,
    pub generated: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Announcement {
    pub title: Option<String>,
    pub short_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsletterInfoRecord {
    pub title: String,
    pub content: String,
    pub in_newsletter: Option<bool>,
}

/// One executed request: template name, graph and whether it was a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub key: String,
    pub graph: String,
    pub write: bool,
}

#[derive(Debug, Clone, Default)]
pub struct State {
    /// Decisions per graph.
    pub decisions: BTreeMap<String, BTreeMap<String, Decision>>,
    /// Agenda items of the primary graph.
    pub agenda_items: BTreeSet<String>,
    /// Sets of agenda items that are versions of one logical item.
    pub version_groups: Vec<BTreeSet<String>>,
    pub subcases: BTreeMap<String, String>,
    /// Legacy newsletter info per subcase.
    pub subcase_infos: BTreeMap<String, String>,
    pub announcements: BTreeMap<String, Announcement>,
    pub treatments: BTreeMap<String, TreatmentRecord>,
    /// Report IRI to the treatment it describes.
    pub reports: BTreeMap<String, String>,
    pub newsletter_infos: BTreeMap<String, NewsletterInfoRecord>,
    pub requests: Vec<Request>,
    /// Bare agenda items left when subcases were attached.
    pub untreated_at_attach: Option<usize>,
    /// Update requests received, failed ones included.
    pub write_requests: usize,
    /// Fail the n-th update request (1-based) with a 503.
    pub fail_on_write: Option<usize>,
}

impl State {
    pub fn decision(&mut self, graph: &str, uri: &str, decision: Decision) {
        self.decisions
            .entry(graph.to_string())
            .or_default()
            .insert(uri.to_string(), decision);
    }

    pub fn agenda_item(&mut self, uri: &str) {
        self.agenda_items.insert(uri.to_string());
    }

    pub fn versions(&mut self, uris: &[&str]) {
        for uri in uris {
            self.agenda_item(uri);
        }
        self.version_groups
            .push(uris.iter().map(|u| u.to_string()).collect());
    }

    fn is_treated(&self, graph: &str, item: &str) -> bool {
        self.treatments
            .values()
            .any(|t| t.graph == graph && t.typed && t.subjects.contains(item))
    }

    fn is_converted(&self, graph: &str, decision: &str) -> bool {
        self.treatments
            .values()
            .any(|t| t.graph == graph && t.derived_from.as_deref() == Some(decision))
    }

    fn bare_items(&self, graph: &str) -> Vec<String> {
        self.agenda_items
            .iter()
            .filter(|item| !self.is_treated(graph, item))
            .cloned()
            .collect()
    }

    /// Requests for one template in one graph.
    pub fn count(&self, key: &str, graph: &str, write: bool) -> usize {
        self.requests
            .iter()
            .filter(|r| r.key == key && r.graph == graph && r.write == write)
            .count()
    }

    /// Position of the first request for `key`, if any.
    pub fn first_index(&self, key: &str) -> Option<usize> {
        self.requests.iter().position(|r| r.key == key)
    }

    /// Position of the last request for `key`, if any.
    pub fn last_index(&self, key: &str) -> Option<usize> {
        self.requests.iter().rposition(|r| r.key == key)
    }
}

pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new(state: State) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
        })
    }

    pub fn snapshot(&self) -> State {
        self.state.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.state.lock().unwrap().requests.clear();
    }
}

/// Split a request into `(template, body)` segments.
fn segments(text: &str) -> Vec<(String, String)> {
    let header = Regex::new(r"(?m)^# ([a-z-]+)$").unwrap();
    let starts: Vec<_> = header.captures_iter(text).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, captures)| {
            let whole = captures.get(0).unwrap();
            let end = starts
                .get(i + 1)
                .map(|next| next.get(0).unwrap().start())
                .unwrap_or(text.len());
            (captures[1].to_string(), text[whole.end()..end].to_string())
        })
        .collect()
}

fn graph_of(body: &str) -> String {
    let re = Regex::new(r"GRAPH <([^>]+)>").unwrap();
    re.captures(body)
        .map(|c| c[1].to_string())
        .unwrap_or_default()
}

/// Projected variables of a `SELECT`.
fn projection_of(body: &str) -> String {
    let re = Regex::new(r"SELECT (?:DISTINCT )?([^\n]*)").unwrap();
    re.captures(body)
        .map(|c| c[1].to_string())
        .unwrap_or_default()
}

fn limit_of(body: &str) -> usize {
    let re = Regex::new(r"LIMIT (\d+)").unwrap();
    re.captures(body)
        .map(|c| c[1].parse().unwrap())
        .unwrap_or(usize::MAX)
}

fn values_of(body: &str) -> Vec<String> {
    let block = Regex::new(r"VALUES \?\w+ \{([^}]*)\}").unwrap();
    let iri = Regex::new(r"<([^>]+)>").unwrap();
    block
        .captures(body)
        .map(|c| {
            iri.captures_iter(&c[1])
                .map(|i| i[1].to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Triples of an `INSERT DATA` body, one per line.
fn triples_of(body: &str) -> Vec<(String, String, String)> {
    let re = Regex::new(r"(?m)^\s*<([^>]+)> <([^>]+)> (.+) \.$").unwrap();
    re.captures_iter(body)
        .map(|c| (c[1].to_string(), c[2].to_string(), c[3].to_string()))
        .collect()
}

fn iri(term: &str) -> String {
    term.trim_start_matches('<').trim_end_matches('>').to_string()
}

fn literal(term: &str) -> String {
    let inner = term
        .split("\"^^")
        .next()
        .unwrap_or(term)
        .trim_start_matches('"')
        .trim_end_matches('"');
    inner
        .replace("\\n", "\n")
        .replace("\\\"", "\"")
        .replace("\\\\", "\\")
}

#[async_trait]
impl TripleStore for MemoryStore {
    async fn execute_read(&self, query: &str) -> Result<Vec<Row>, StoreError> {
        let mut state = self.state.lock().unwrap();
        let (key, body) = segments(query)
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidResponse("query without template header".into()))?;
        let graph = graph_of(&body);
        state.requests.push(Request {
            key: key.clone(),
            graph: graph.clone(),
            write: false,
        });

        let rows = match key.as_str() {
            "list-decisions" => {
                // One row per solution, so LIMIT counts rows like a real store
                let with_items = projection_of(&body).contains("?agendaItem");
                let decisions = state.decisions.get(&graph).cloned().unwrap_or_default();
                let mut rows = Vec::new();
                for (uri, d) in &decisions {
                    if state.is_converted(&graph, uri) {
                        continue;
                    }
                    if with_items && !d.agenda_items.is_empty() {
                        for item in &d.agenda_items {
                            rows.push(Row::from_uris([
                                ("decision", uri.as_str()),
                                ("agendaItem", item.as_str()),
                            ]));
                        }
                    } else {
                        rows.push(Row::from_uris([("decision", uri.as_str())]));
                    }
                }
                rows.truncate(limit_of(&body));
                rows
            }
            "list-bare-agendaitems" => state
                .bare_items(&graph)
                .iter()
                .take(limit_of(&body))
                .map(|item| Row::from_uris([("agendaItem", item.as_str())]))
                .collect(),
            "list-agendaitem-versions" => {
                let mut rows = Vec::new();
                for item in values_of(&body) {
                    let Some(group) = state.version_groups.iter().find(|g| g.contains(&item))
                    else {
                        continue;
                    };
                    for version in group.iter().filter(|v| **v != item) {
                        let treatments: Vec<_> = state
                            .treatments
                            .iter()
                            .filter(|(_, t)| t.graph == graph && t.subjects.contains(version))
                            .map(|(uri, _)| uri.clone())
                            .collect();
                        if treatments.is_empty() {
                            rows.push(Row::from_uris([
                                ("agendaItem", item.as_str()),
                                ("version", version.as_str()),
                            ]));
                        }
                        for treatment in &treatments {
                            rows.push(Row::from_uris([
                                ("agendaItem", item.as_str()),
                                ("version", version.as_str()),
                                ("treatment", treatment.as_str()),
                            ]));
                        }
                    }
                }
                rows
            }
            "list-announcements-without-newsletter-info" => {
                let mut rows = Vec::new();
                for item in state.announcements.keys() {
                    for (uri, t) in &state.treatments {
                        if t.graph == graph && t.subjects.contains(item) && t.generated.is_empty()
                        {
                            rows.push(Row::from_uris([
                                ("agendaItem", item.as_str()),
                                ("treatment", uri.as_str()),
                            ]));
                        }
                    }
                }
                rows
            }
            "announcement-metadata" => {
                let item = values_of(&body).into_iter().next().unwrap_or_default();
                let announcement = state.announcements.get(&item).cloned().unwrap_or_default();
                let mut row = Row::default();
                if let Some(title) = &announcement.title {
                    row = row.with_literal("title", title);
                }
                if let Some(short_title) = &announcement.short_title {
                    row = row.with_literal("shortTitle", short_title);
                }
                vec![row]
            }
            other => {
                return Err(StoreError::InvalidResponse(format!(
                    "unexpected read template {other}"
                )));
            }
        };
        Ok(rows)
    }

    async fn execute_write(&self, update: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.write_requests += 1;
        if state.fail_on_write == Some(state.write_requests) {
            state.fail_on_write = None;
            return Err(StoreError::Endpoint {
                status: 503,
                body: "Service Unavailable".to_string(),
            });
        }

        for (key, body) in segments(update) {
            let graph = graph_of(&body);
            state.requests.push(Request {
                key: key.clone(),
                graph: graph.clone(),
                write: true,
            });
            apply_write(&mut state, &key, &graph, &body)?;
        }
        Ok(())
    }
}

fn apply_write(state: &mut State, key: &str, graph: &str, body: &str) -> Result<(), StoreError> {
    match key {
        "insert-treatments" => {
            for (subject, predicate, object) in triples_of(body) {
                let record = state.treatments.entry(subject).or_default();
                record.graph = graph.to_string();
                match predicate.as_str() {
                    vocab::RDF_TYPE => record.typed = true,
                    vocab::MU_UUID => record.uuid = Some(literal(&object)),
                    vocab::DCT_SUBJECT => {
                        record.subjects.insert(iri(&object));
                    }
                    vocab::PROV_WAS_DERIVED_FROM => record.derived_from = Some(iri(&object)),
                    other => {
                        return Err(StoreError::InvalidResponse(format!(
                            "unexpected treatment predicate {other}"
                        )));
                    }
                }
            }
        }
        "link-decision-resources" => {
            for decision_uri in values_of(body) {
                let Some(decision) = state
                    .decisions
                    .get(graph)
                    .and_then(|d| d.get(&decision_uri))
                    .cloned()
                else {
                    continue;
                };
                let treatments: Vec<String> = state
                    .treatments
                    .iter()
                    .filter(|(_, t)| {
                        t.graph == graph && t.derived_from.as_deref() == Some(decision_uri.as_str())
                    })
                    .map(|(uri, _)| uri.clone())
                    .collect();
                for treatment in treatments {
                    if let Some(t) = state.treatments.get_mut(&treatment) {
                        t.subjects.extend(decision.agenda_items.iter().cloned());
                    }
                    if let Some(report) = &decision.report {
                        state.reports.insert(report.clone(), treatment.clone());
                    }
                    if let Some(info) = &decision.newsletter_info {
                        if let Some(t) = state.treatments.get_mut(&treatment) {
                            t.generated.insert(info.clone());
                        }
                    }
                }
            }
        }
        "attach-subcases" => {
            state.untreated_at_attach = Some(state.bare_items(graph).len());
            let subcases = state.subcases.clone();
            for t in state.treatments.values_mut() {
                if t.graph != graph || !t.typed || t.subcase.is_some() {
                    continue;
                }
                t.subcase = t.subjects.iter().find_map(|s| subcases.get(s).cloned());
            }
        }
        "link-newsletter-infos" => {
            let infos = state.subcase_infos.clone();
            for t in state.treatments.values_mut() {
                if t.graph != graph || !t.generated.is_empty() {
                    continue;
                }
                if let Some(info) = t.subcase.as_ref().and_then(|s| infos.get(s)) {
                    t.generated.insert(info.clone());
                }
            }
        }
        "insert-newsletter-info" => {
            let mut info_uri = None;
            let mut title = String::new();
            let mut content = String::new();
            let mut in_newsletter = None;
            let mut generated_by = None;
            for (subject, predicate, object) in triples_of(body) {
                match predicate.as_str() {
                    vocab::RDF_TYPE => info_uri = Some(subject),
                    vocab::DCT_TITLE => title = literal(&object),
                    vocab::EXT_HTML_CONTENT => content = literal(&object),
                    vocab::EXT_IN_NEWSLETTER => in_newsletter = Some(literal(&object) == "true"),
                    vocab::PROV_GENERATED => generated_by = Some((subject, iri(&object))),
                    _ => {}
                }
            }
            let uri = info_uri
                .ok_or_else(|| StoreError::InvalidResponse("newsletter info without type".into()))?;
            state.newsletter_infos.insert(
                uri,
                NewsletterInfoRecord {
                    title,
                    content,
                    in_newsletter,
                },
            );
            if let Some((treatment, info)) = generated_by {
                if let Some(t) = state.treatments.get_mut(&treatment) {
                    t.generated.insert(info);
                }
            }
        }
        "normalize-result-codes" | "normalize-decision-dates" => {}
        other => {
            return Err(StoreError::InvalidResponse(format!(
                "unexpected write template {other}"
            )));
        }
    }
    Ok(())
}

pub fn context(store: Arc<MemoryStore>, batch_size: usize, graphs: &[&str]) -> MigrationContext {
    let config = MigrationConfig::default()
        .with_batch_size(BatchSize::new(batch_size).unwrap())
        .with_graphs(graphs.iter().copied());
    let queries = QueryBuilder::new(TemplateRegistry::builtin().unwrap(), &config.schema);
    MigrationContext::new(store, queries, config)
}

/// Three decisions in the primary graph.
pub fn three_decisions() -> State {
    let mut state = State::default();
    for n in 1..=3 {
        state.agenda_item(&format!("http://x/ap/{n}"));
        state.decision(
            KANSELARIJ,
            &format!("http://x/besluit/{n}"),
            Decision {
                agenda_items: vec![format!("http://x/ap/{n}")],
                report: Some(format!("http://x/verslag/{n}")),
                newsletter_info: Some(format!("http://x/nli/{n}")),
            },
        );
    }
    state
}

/// Decisions in two graphs, versioned bare items, subcases and announcements.
pub fn full_fixture() -> State {
    let mut state = three_decisions();

    state.decision(
        MINISTER,
        "http://x/besluit/4",
        Decision {
            agenda_items: Vec::new(),
            report: Some("http://x/verslag/4".to_string()),
            newsletter_info: None,
        },
    );

    // ap/8 is a later version of the decided ap/1
    state.versions(&["http://x/ap/1", "http://x/ap/8"]);
    // ap/5 and ap/6 are bare versions of one item
    state.versions(&["http://x/ap/5", "http://x/ap/6"]);
    state.agenda_item("http://x/ap/7");
    state.agenda_item("http://x/ap/9");

    state
        .subcases
        .insert("http://x/ap/2".to_string(), "http://x/procedurestap/2".to_string());
    state
        .subcases
        .insert("http://x/ap/6".to_string(), "http://x/procedurestap/6".to_string());
    state.subcase_infos.insert(
        "http://x/procedurestap/6".to_string(),
        "http://x/nli/legacy-6".to_string(),
    );

    state.announcements.insert(
        "http://x/ap/6".to_string(),
        Announcement {
            title: Some("Mededeling zes".to_string()),
            short_title: None,
        },
    );
    state.announcements.insert(
        "http://x/ap/7".to_string(),
        Announcement {
            title: Some("Lange titel".to_string()),
            short_title: Some("Kort".to_string()),
        },
    );
    state
        .announcements
        .insert("http://x/ap/9".to_string(), Announcement::default());

    state
}

/// Treatment state with minted IRIs replaced by their sorted subjects, so two
/// runs can be compared.
pub fn treatment_shapes(state: &State) -> BTreeSet<(String, Vec<String>, Option<String>)> {
    state
        .treatments
        .values()
        .map(|t| {
            (
                t.graph.clone(),
                t.subjects.iter().cloned().collect(),
                t.derived_from.clone(),
            )
        })
        .collect()
}

pub fn default_schema() -> SchemaVersion {
    SchemaVersion::default()
}
