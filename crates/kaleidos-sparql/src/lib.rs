//! SPARQL access for the Kaleidos treatment migration.
//!
//! This crate provides the store side of the migration:
//!
//! - **Client**: SPARQL 1.1 protocol over HTTP (`query=` / `update=` form posts)
//! - **Results**: rows decoded from `application/sparql-results+json`
//! - **Escaping**: IRI and literal escaping for values interpolated into queries
//! - **Store trait**: [`TripleStore`], the seam the migration steps are written against

mod client;
mod error;
pub mod escape;
mod results;
mod store;

pub use client::{
    DEFAULT_ENDPOINT, SPARQL_RESULTS_JSON, SUDO_HEADER, SparqlClient, SparqlClientBuilder,
};
pub use error::{InvalidIri, StoreError};
pub use escape::{escape_bool, escape_string, escape_uri, join_uris};
pub use results::{Row, Term, TermKind, parse_select_results};
pub use store::TripleStore;
