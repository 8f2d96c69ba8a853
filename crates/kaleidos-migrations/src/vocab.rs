//! Predicate and class IRIs used in triples rendered by the migration.
//!
//! Templates declare their own prefixes; these are only needed for data
//! written with `INSERT DATA`.

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

pub const MU_UUID: &str = "http://mu.semte.ch/vocabularies/core/uuid";

pub const DCT_SUBJECT: &str = "http://purl.org/dc/terms/subject";
pub const DCT_TITLE: &str = "http://purl.org/dc/terms/title";

pub const PROV_WAS_DERIVED_FROM: &str = "http://www.w3.org/ns/prov#wasDerivedFrom";
pub const PROV_GENERATED: &str = "http://www.w3.org/ns/prov#generated";

pub const NEWSLETTER_INFO: &str = "https://data.vlaanderen.be/ns/besluitvorming#NieuwsbriefInfo";
pub const EXT_HTML_CONTENT: &str = "http://mu.semte.ch/vocabularies/ext/htmlInhoud";
pub const EXT_IN_NEWSLETTER: &str = "http://mu.semte.ch/vocabularies/ext/inNieuwsbrief";
