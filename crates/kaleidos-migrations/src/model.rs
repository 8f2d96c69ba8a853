//! Resources created or read by the migration steps.

use kaleidos_sparql::Row;
use uuid::Uuid;

use crate::config::{NEWSLETTER_INFO_BASE_URI, TREATMENT_BASE_URI};

/// A treatment the migration writes.
///
/// Either freshly minted (has a `uuid`) or an existing treatment that gains
/// extra `dct:subject` links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Treatment {
    pub uri: String,
    /// Set only for treatments minted in this run.
    pub uuid: Option<String>,
    /// Agenda-item versions this treatment handles.
    pub subjects: Vec<String>,
    /// Legacy decision the treatment replaces.
    pub derived_from: Option<String>,
}

impl Treatment {
    /// Mint a new treatment with a random UUID.
    pub fn mint(subjects: Vec<String>, derived_from: Option<String>) -> Self {
        let uuid = Uuid::new_v4().to_string();
        Self {
            uri: format!("{}{}", TREATMENT_BASE_URI, uuid),
            uuid: Some(uuid),
            subjects,
            derived_from,
        }
    }

    /// An existing treatment to which `subjects` are added.
    pub fn existing(uri: impl Into<String>, subjects: Vec<String>) -> Self {
        Self {
            uri: uri.into(),
            uuid: None,
            subjects,
            derived_from: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.uuid.is_some()
    }
}

/// Display metadata of an announcement. Fields are absent when unbound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnouncementMetadata {
    pub title: Option<String>,
    pub short_title: Option<String>,
}

impl AnnouncementMetadata {
    /// Read from a metadata row; a missing row means no metadata at all.
    pub fn from_row(row: Option<&Row>) -> Self {
        Self {
            title: row.and_then(|r| r.get("title")).map(str::to_string),
            short_title: row.and_then(|r| r.get("shortTitle")).map(str::to_string),
        }
    }

    /// Newsletter title: the short title, falling back to the title.
    pub fn newsletter_title(&self) -> &str {
        self.short_title
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("")
    }

    /// Newsletter content: the full title.
    pub fn newsletter_content(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

/// A newsletter info synthesized for a treatment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsletterInfo {
    pub uri: String,
    pub uuid: String,
    /// Treatment that generates this info.
    pub treatment: String,
    pub title: String,
    pub content: String,
    /// `Some(true)` when the deployment flags infos for inclusion.
    pub in_newsletter: Option<bool>,
}

impl NewsletterInfo {
    pub fn synthesize(treatment: &str, metadata: &AnnouncementMetadata, flag: bool) -> Self {
        let uuid = Uuid::new_v4().to_string();
        Self {
            uri: format!("{}{}", NEWSLETTER_INFO_BASE_URI, uuid),
            uuid,
            treatment: treatment.to_string(),
            title: metadata.newsletter_title().to_string(),
            content: metadata.newsletter_content().to_string(),
            in_newsletter: flag.then_some(true),
        }
    }
}
