//! Query templates and placeholder substitution.
//!
//! Templates are SPARQL files whose variable parts are marked with comment
//! tokens such as `# GRAPH_PLACEHOLDER`, so every template is itself a valid
//! query. The registry is loaded once at startup and validated before any
//! store access.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::ConfigError;

/// Matches anything that looks like a placeholder token, well-formed or not.
static PLACEHOLDER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#(\s*)([A-Z][A-Z_]*)_PLACEHOLDER").expect("placeholder regex is valid")
});

/// A variable part of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// Graph IRI.
    Graph,
    /// Page size.
    Limit,
    /// Newline-separated escaped IRIs for a `VALUES` block.
    Values,
    /// Rendered triples for an `INSERT DATA` block.
    Triples,
    /// IRI of the treatment class.
    TreatmentType,
    /// A single resource IRI.
    Subject,
}

impl Placeholder {
    pub const ALL: [Placeholder; 6] = [
        Placeholder::Graph,
        Placeholder::Limit,
        Placeholder::Values,
        Placeholder::Triples,
        Placeholder::TreatmentType,
        Placeholder::Subject,
    ];

    /// Token as it appears in a template.
    pub fn token(self) -> &'static str {
        match self {
            Placeholder::Graph => "# GRAPH_PLACEHOLDER",
            Placeholder::Limit => "# LIMIT_PLACEHOLDER",
            Placeholder::Values => "# VALUES_PLACEHOLDER",
            Placeholder::Triples => "# TRIPLES_PLACEHOLDER",
            Placeholder::TreatmentType => "# TREATMENT_TYPE_PLACEHOLDER",
            Placeholder::Subject => "# SUBJECT_PLACEHOLDER",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| {
            p.token()
                .strip_prefix("# ")
                .and_then(|t| t.strip_suffix("_PLACEHOLDER"))
                == Some(name)
        })
    }
}

/// Identifies one query template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    ListDecisions,
    InsertTreatments,
    LinkDecisionResources,
    ListBareAgendaItems,
    ListAgendaItemVersions,
    AttachSubcases,
    LinkNewsletterInfos,
    ListAnnouncementsWithoutNewsletterInfo,
    AnnouncementMetadata,
    InsertNewsletterInfo,
    NormalizeResultCodes,
    NormalizeDecisionDates,
}

impl TemplateKey {
    pub const ALL: [TemplateKey; 12] = [
        TemplateKey::ListDecisions,
        TemplateKey::InsertTreatments,
        TemplateKey::LinkDecisionResources,
        TemplateKey::ListBareAgendaItems,
        TemplateKey::ListAgendaItemVersions,
        TemplateKey::AttachSubcases,
        TemplateKey::LinkNewsletterInfos,
        TemplateKey::ListAnnouncementsWithoutNewsletterInfo,
        TemplateKey::AnnouncementMetadata,
        TemplateKey::InsertNewsletterInfo,
        TemplateKey::NormalizeResultCodes,
        TemplateKey::NormalizeDecisionDates,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TemplateKey::ListDecisions => "list-decisions",
            TemplateKey::InsertTreatments => "insert-treatments",
            TemplateKey::LinkDecisionResources => "link-decision-resources",
            TemplateKey::ListBareAgendaItems => "list-bare-agendaitems",
            TemplateKey::ListAgendaItemVersions => "list-agendaitem-versions",
            TemplateKey::AttachSubcases => "attach-subcases",
            TemplateKey::LinkNewsletterInfos => "link-newsletter-infos",
            TemplateKey::ListAnnouncementsWithoutNewsletterInfo => {
                "list-announcements-without-newsletter-info"
            }
            TemplateKey::AnnouncementMetadata => "announcement-metadata",
            TemplateKey::InsertNewsletterInfo => "insert-newsletter-info",
            TemplateKey::NormalizeResultCodes => "normalize-result-codes",
            TemplateKey::NormalizeDecisionDates => "normalize-decision-dates",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.sparql", self.name())
    }

    /// Placeholders the template must contain.
    pub fn required_placeholders(self) -> &'static [Placeholder] {
        use Placeholder::*;
        match self {
            TemplateKey::ListDecisions => &[Graph, Limit],
            TemplateKey::InsertTreatments | TemplateKey::InsertNewsletterInfo => &[Graph, Triples],
            TemplateKey::LinkDecisionResources => &[Graph, Values],
            TemplateKey::ListBareAgendaItems => &[Graph, Limit, TreatmentType],
            TemplateKey::ListAgendaItemVersions => &[Graph, Values, TreatmentType],
            TemplateKey::AttachSubcases
            | TemplateKey::LinkNewsletterInfos
            | TemplateKey::ListAnnouncementsWithoutNewsletterInfo => &[Graph, TreatmentType],
            TemplateKey::AnnouncementMetadata => &[Graph, Subject],
            TemplateKey::NormalizeResultCodes | TemplateKey::NormalizeDecisionDates => &[Graph],
        }
    }

    fn builtin_source(self) -> &'static str {
        match self {
            TemplateKey::ListDecisions => include_str!("../queries/list-decisions.sparql"),
            TemplateKey::InsertTreatments => include_str!("../queries/insert-treatments.sparql"),
            TemplateKey::LinkDecisionResources => {
                include_str!("../queries/link-decision-resources.sparql")
            }
            TemplateKey::ListBareAgendaItems => {
                include_str!("../queries/list-bare-agendaitems.sparql")
            }
            TemplateKey::ListAgendaItemVersions => {
                include_str!("../queries/list-agendaitem-versions.sparql")
            }
            TemplateKey::AttachSubcases => include_str!("../queries/attach-subcases.sparql"),
            TemplateKey::LinkNewsletterInfos => {
                include_str!("../queries/link-newsletter-infos.sparql")
            }
            TemplateKey::ListAnnouncementsWithoutNewsletterInfo => {
                include_str!("../queries/list-announcements-without-newsletter-info.sparql")
            }
            TemplateKey::AnnouncementMetadata => {
                include_str!("../queries/announcement-metadata.sparql")
            }
            TemplateKey::InsertNewsletterInfo => {
                include_str!("../queries/insert-newsletter-info.sparql")
            }
            TemplateKey::NormalizeResultCodes => {
                include_str!("../queries/normalize-result-codes.sparql")
            }
            TemplateKey::NormalizeDecisionDates => {
                include_str!("../queries/normalize-decision-dates.sparql")
            }
        }
    }
}

/// All query templates, keyed by [`TemplateKey`].
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<TemplateKey, String>,
}

impl TemplateRegistry {
    /// Templates compiled into the binary.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_sources(
            TemplateKey::ALL
                .into_iter()
                .map(|key| (key, key.builtin_source().to_string())),
        )
    }

    /// Read every template from `dir`, one `<name>.sparql` file per key.
    pub fn load_dir(dir: &Path) -> Result<Self, ConfigError> {
        let mut sources = Vec::with_capacity(TemplateKey::ALL.len());
        for key in TemplateKey::ALL {
            let path = dir.join(key.file_name());
            let source = std::fs::read_to_string(&path).map_err(|source| {
                ConfigError::MissingTemplate {
                    key: key.name(),
                    path: path.clone(),
                    source,
                }
            })?;
            sources.push((key, source));
        }
        Self::from_sources(sources)
    }

    fn from_sources(
        sources: impl IntoIterator<Item = (TemplateKey, String)>,
    ) -> Result<Self, ConfigError> {
        let templates: HashMap<_, _> = sources.into_iter().collect();
        for (key, source) in &templates {
            validate(*key, source)?;
        }
        Ok(Self { templates })
    }

    /// Template text for `key`.
    pub fn get(&self, key: TemplateKey) -> &str {
        // Both constructors insert every key
        self.templates.get(&key).map(String::as_str).unwrap_or_default()
    }
}

fn validate(key: TemplateKey, source: &str) -> Result<(), ConfigError> {
    for placeholder in key.required_placeholders() {
        if !source.contains(placeholder.token()) {
            return Err(ConfigError::MissingPlaceholder {
                key: key.name(),
                placeholder: placeholder.token(),
            });
        }
    }

    // Substitution only replaces the exact `# NAME_PLACEHOLDER` form
    for captures in PLACEHOLDER_TOKEN.captures_iter(source) {
        let known = &captures[1] == " "
            && Placeholder::from_name(&captures[2])
                .is_some_and(|p| key.required_placeholders().contains(&p));
        if !known {
            return Err(ConfigError::UnknownPlaceholder {
                key: key.name(),
                token: captures[0].to_string(),
            });
        }
    }

    Ok(())
}

/// Replace every occurrence of each placeholder token with its value.
///
/// Values must already be escaped for the position they land in.
pub fn substitute(template: &str, values: &[(Placeholder, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |text, (placeholder, value)| {
            text.replace(placeholder.token(), value)
        })
}
