//! kaleidos-migrate: converts legacy decisions in the Kaleidos triple store
//! to the treatment model.
//!
//! Without flags the binary runs the whole pipeline against
//! `MU_SPARQL_ENDPOINT`. `--list` prints the steps, `--step <name>` runs one.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use kaleidos_migrations::{BatchSize, TreatmentVocabulary};
use kaleidos_sparql::DEFAULT_ENDPOINT;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod migrate;

/// Parse boolean from environment variable, accepting common truthy values.
/// Accepts "1", "true", "yes", "on" (case-insensitive) as true.
/// Accepts "0", "false", "no", "off", "" (case-insensitive) as false.
fn parse_bool_env(s: &str) -> Result<bool, String> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(format!(
            "invalid boolean value '{}', expected 1/true/yes/on or 0/false/no/off",
            s
        )),
    }
}

#[derive(Parser, Debug)]
#[command(name = "kaleidos-migrate")]
#[command(about = "Convert Kaleidos decisions to treatments", long_about = None)]
struct Cli {
    /// SPARQL endpoint
    #[arg(long, env = "MU_SPARQL_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Entities converted per request
    #[arg(long, env = "BATCH_SIZE", default_value = "200")]
    batch_size: BatchSize,

    /// Directory with query templates; defaults to the built-in set
    #[arg(long, env = "QUERIES_DIR")]
    queries_dir: Option<PathBuf>,

    /// Treatment class vocabulary: besluit or besluitvorming
    #[arg(long, env = "TREATMENT_VOCABULARY", default_value = "besluit")]
    treatment_vocabulary: TreatmentVocabulary,

    /// Mark synthesized newsletter infos with ext:inNieuwsbrief true
    #[arg(
        long,
        env = "NEWSLETTER_INCLUSION_FLAG",
        value_parser = parse_bool_env,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "true",
        default_missing_value = "true"
    )]
    newsletter_flag: bool,

    /// Send the mu-auth-sudo header
    #[arg(
        long,
        env = "MU_AUTH_SUDO",
        value_parser = parse_bool_env,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    sudo: bool,

    /// Per-request timeout in seconds
    #[arg(long, env = "SPARQL_REQUEST_TIMEOUT", default_value = "300")]
    request_timeout_secs: u64,

    /// Retries for transient store failures. The default of 0 fails fast.
    #[arg(long, env = "SPARQL_MAX_RETRIES", default_value = "0")]
    max_retries: u32,

    /// Run only this step
    #[arg(long)]
    step: Option<String>,

    /// List the steps in order and exit
    #[arg(long)]
    list: bool,
}

impl From<Cli> for migrate::MigrateOptions {
    fn from(cli: Cli) -> Self {
        Self {
            endpoint: cli.endpoint,
            batch_size: cli.batch_size,
            queries_dir: cli.queries_dir,
            treatment_vocabulary: cli.treatment_vocabulary,
            newsletter_flag: cli.newsletter_flag,
            sudo: cli.sudo,
            request_timeout_secs: cli.request_timeout_secs,
            max_retries: cli.max_retries,
            step: cli.step,
            list: cli.list,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                "kaleidos_migrate=info,kaleidos_migrations=info,kaleidos_sparql=info".to_string()
            }),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    migrate::run_migrate_command(cli.into()).await
}
