//! Wires the store client, templates and pipeline together for one run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use kaleidos_migrations::{
    BatchSize, MigrationConfig, MigrationContext, Pipeline, PipelineReport, QueryBuilder,
    SchemaVersion, TemplateRegistry, TreatmentVocabulary,
};
use kaleidos_sparql::SparqlClient;
use miette::Result;
use tracing::{info, warn};

/// Options for one invocation, as parsed from flags and environment.
#[derive(Debug, Clone)]
pub struct MigrateOptions {
    pub endpoint: String,
    pub batch_size: BatchSize,
    pub queries_dir: Option<PathBuf>,
    pub treatment_vocabulary: TreatmentVocabulary,
    pub newsletter_flag: bool,
    pub sudo: bool,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub step: Option<String>,
    pub list: bool,
}

impl MigrateOptions {
    fn config(&self) -> MigrationConfig {
        MigrationConfig::default()
            .with_batch_size(self.batch_size)
            .with_schema(SchemaVersion {
                treatment_vocabulary: self.treatment_vocabulary,
                newsletter_inclusion_flag: self.newsletter_flag,
            })
    }
}

/// Built-in templates, or the ones in `dir` when given.
fn load_templates(dir: Option<&PathBuf>) -> Result<TemplateRegistry> {
    let registry = match dir {
        Some(dir) => {
            info!(dir = %dir.display(), "loading query templates");
            TemplateRegistry::load_dir(dir)
        }
        None => TemplateRegistry::builtin(),
    };
    registry.map_err(|e| miette::miette!("{}", e))
}

/// Print the steps in pipeline order.
fn print_steps(pipeline: &Pipeline) {
    println!("Migration steps, in order:\n");
    for (n, (name, description)) in pipeline.steps().into_iter().enumerate() {
        println!("  {}. {}", n + 1, name);
        println!("      {}\n", description);
    }
}

fn log_report(report: &PipelineReport) {
    for step in &report.steps {
        info!(
            step = step.step,
            graph = %step.graph,
            batches = step.batches,
            records = step.records,
            "step summary"
        );
    }
    info!(
        records = report.records(),
        batches = report.batches(),
        seconds = report.duration().num_seconds(),
        "run complete"
    );
}

/// Run the migrate command with the given options.
pub async fn run_migrate_command(options: MigrateOptions) -> Result<()> {
    let pipeline = Pipeline::standard();

    if options.list {
        print_steps(&pipeline);
        return Ok(());
    }

    // Template problems surface before the store is touched
    let templates = load_templates(options.queries_dir.as_ref())?;
    let config = options.config();
    let queries = QueryBuilder::new(templates, &config.schema);

    let client = SparqlClient::builder(options.endpoint.clone())
        .request_timeout(Duration::from_secs(options.request_timeout_secs))
        .sudo(options.sudo)
        .max_retries(options.max_retries)
        .build()
        .map_err(|e| miette::miette!("{}", e))?;

    info!(
        endpoint = %client.endpoint(),
        batch_size = %config.batch_size,
        vocabulary = %config.schema.treatment_vocabulary,
        newsletter_flag = config.schema.newsletter_inclusion_flag,
        sudo = options.sudo,
        max_retries = options.max_retries,
        "starting migration"
    );

    let ctx = MigrationContext::new(Arc::new(client), queries, config);
    let run = async {
        match options.step.as_deref() {
            Some(step) => pipeline.run_only(&ctx, step).await,
            None => pipeline.run(&ctx).await,
        }
    };

    let report = tokio::select! {
        result = run => result.map_err(|e| miette::miette!("{}", e))?,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; re-run to continue where the migration stopped");
            return Err(miette::miette!("migration interrupted"));
        }
    };

    log_report(&report);
    Ok(())
}
