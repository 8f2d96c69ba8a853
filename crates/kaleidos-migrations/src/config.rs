//! Migration configuration: graphs, batch size and pinned schema choices.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use crate::ConfigError;

/// Graphs migrated by the per-graph steps, in processing order.
pub const GRAPHS: [&str; 5] = [
    "http://mu.semte.ch/graphs/organizations/kanselarij",
    "http://mu.semte.ch/graphs/organizations/minister",
    "http://mu.semte.ch/graphs/organizations/intern-regering",
    "http://mu.semte.ch/graphs/organizations/intern-overheid",
    "http://mu.semte.ch/graphs/public",
];

/// Graph the primary-graph steps run against.
pub const PRIMARY_GRAPH: &str = GRAPHS[0];

/// Base IRI for minted treatments.
pub const TREATMENT_BASE_URI: &str =
    "http://kanselarij.vo.data.gift/id/behandelingen-van-agendapunt/";

/// Base IRI for minted newsletter infos.
pub const NEWSLETTER_INFO_BASE_URI: &str = "http://kanselarij.vo.data.gift/id/nieuwsbrief-infos/";

/// Page size used when none is configured.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Number of entities requested per page. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(NonZeroUsize);

impl BatchSize {
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(size)
            .map(Self)
            .ok_or_else(|| ConfigError::InvalidBatchSize(size.to_string()))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self(NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

impl FromStr for BatchSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<NonZeroUsize>()
            .map(Self)
            .map_err(|_| ConfigError::InvalidBatchSize(s.to_string()))
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vocabulary of the treatment type marker.
///
/// Two variants of the target schema exist; the run pins one explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreatmentVocabulary {
    #[default]
    Besluit,
    Besluitvorming,
}

impl TreatmentVocabulary {
    /// IRI of the treatment class in this vocabulary.
    pub fn type_uri(self) -> &'static str {
        match self {
            TreatmentVocabulary::Besluit => {
                "http://data.vlaanderen.be/ns/besluit#BehandelingVanAgendapunt"
            }
            TreatmentVocabulary::Besluitvorming => {
                "https://data.vlaanderen.be/ns/besluitvorming#BehandelingVanAgendapunt"
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TreatmentVocabulary::Besluit => "besluit",
            TreatmentVocabulary::Besluitvorming => "besluitvorming",
        }
    }
}

impl FromStr for TreatmentVocabulary {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "besluit" => Ok(TreatmentVocabulary::Besluit),
            "besluitvorming" => Ok(TreatmentVocabulary::Besluitvorming),
            _ => Err(ConfigError::UnknownVocabulary(s.to_string())),
        }
    }
}

impl fmt::Display for TreatmentVocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema choices that differ between deployments of the target model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaVersion {
    pub treatment_vocabulary: TreatmentVocabulary,
    /// Whether synthesized newsletter infos get `ext:inNieuwsbrief true`.
    pub newsletter_inclusion_flag: bool,
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self {
            treatment_vocabulary: TreatmentVocabulary::default(),
            newsletter_inclusion_flag: true,
        }
    }
}

/// Everything a run needs besides the store and the templates.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub batch_size: BatchSize,
    /// Graphs for the per-graph steps, in order.
    pub graphs: Vec<String>,
    pub primary_graph: String,
    pub schema: SchemaVersion,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            batch_size: BatchSize::default(),
            graphs: GRAPHS.iter().map(|g| g.to_string()).collect(),
            primary_graph: PRIMARY_GRAPH.to_string(),
            schema: SchemaVersion::default(),
        }
    }
}

impl MigrationConfig {
    pub fn with_batch_size(mut self, batch_size: BatchSize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_schema(mut self, schema: SchemaVersion) -> Self {
        self.schema = schema;
        self
    }

    /// Replace the graph list; the first graph becomes the primary graph.
    pub fn with_graphs<S: Into<String>>(mut self, graphs: impl IntoIterator<Item = S>) -> Self {
        self.graphs = graphs.into_iter().map(Into::into).collect();
        if let Some(first) = self.graphs.first() {
            self.primary_graph = first.clone();
        }
        self
    }
}
