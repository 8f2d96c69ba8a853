//! Decision-to-treatment migration for the Kaleidos triple store.
//!
//! The migration rewrites legacy decisions into the treatment model in seven
//! ordered steps. Each step reads only data that still needs converting, so
//! the whole pipeline can be re-run after a failure:
//!
//! - **Templates**: SPARQL files with comment placeholders, validated at load
//! - **Queries**: typed rendering with every value escaped
//! - **Driver**: offset-free pagination that stops on a short page
//! - **Steps**: the seven conversions
//! - **Pipeline**: runs the steps over the configured graphs

pub mod config;
mod context;
pub mod driver;
mod error;
pub mod model;
mod pipeline;
pub mod queries;
mod report;
pub mod steps;
pub mod templates;
pub mod vocab;

pub use config::{BatchSize, MigrationConfig, SchemaVersion, TreatmentVocabulary};
pub use context::MigrationContext;
pub use driver::{BatchStep, run_to_exhaustion};
pub use error::{ConfigError, MigrationError};
pub use pipeline::Pipeline;
pub use queries::{ListKind, QueryBuilder, Write};
pub use report::{PipelineReport, StepReport};
pub use steps::{MigrationStep, Scope};
pub use templates::{Placeholder, TemplateKey, TemplateRegistry};
