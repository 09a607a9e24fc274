//! Command-line interface for OntoMap.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use ontomap_core::config::env_vars;
use ontomap_core::{
    DynScoringModel, JsonPointSource, MappingConfig, OntologySchema, PointSource,
};
use ontomap_mapping::{
    CancelHandle, FeatureExtractor, KnnModel, LexiconModel, MappingEngine, SemanticGraph,
    SessionInfo, SessionStatus, ValidationReport,
};

/// OntoMap - Map building-automation points onto the Digital Buildings Ontology.
#[derive(Parser, Debug)]
#[command(name = "ontomap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Map a point export and write the graph and validation report.
    Map {
        /// Point export (JSON array or `{ "points": [...] }`).
        #[arg(long)]
        points: PathBuf,
        /// Ontology schema (JSON).
        #[arg(long)]
        schema: PathBuf,
        /// KNN exemplar artifact; the lexicon model is used when omitted.
        #[arg(long)]
        model: Option<PathBuf>,
        /// Mapping configuration (TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Site name.
        #[arg(long, default_value = "site")]
        site: String,
        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the feature vector of every point.
    Features {
        /// Point export (JSON).
        #[arg(long)]
        points: PathBuf,
    },
    /// Load a schema and report dangling references.
    Schema {
        /// Ontology schema (JSON).
        #[arg(long)]
        schema: PathBuf,
    },
}

/// Output of `ontomap map`.
#[derive(Serialize)]
struct MapOutput {
    session: SessionInfo,
    status: SessionStatus,
    graph: SemanticGraph,
    report: ValidationReport,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Map {
            points,
            schema,
            model,
            config,
            site,
            output,
        } => {
            run_map(
                &points,
                &schema,
                model.as_deref(),
                config.as_deref(),
                site,
                output.as_deref(),
            )
            .await
        }
        Command::Features { points } => run_features(&points).await,
        Command::Schema { schema } => run_schema(&schema),
    }
}

fn init_logging(verbose: bool) {
    // Check if JSON logging is requested (for production/container environments)
    let json_logging = std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let default_directive = if verbose { "ontomap=debug" } else { "ontomap=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    // Logs go to stderr so stdout carries only command output
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .init();
    }
}

fn load_schema(path: &Path) -> Result<Arc<OntologySchema>> {
    let schema = OntologySchema::load_checked(path)
        .with_context(|| format!("Failed to load schema {}", path.display()))?;
    Ok(Arc::new(schema))
}

async fn run_map(
    points: &Path,
    schema: &Path,
    model: Option<&Path>,
    config: Option<&Path>,
    site: String,
    output: Option<&Path>,
) -> Result<()> {
    let schema = load_schema(schema)?;
    let config = match config {
        Some(path) => MappingConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MappingConfig::from_env()?,
    };
    let model: DynScoringModel = match model {
        Some(path) => Arc::new(
            KnnModel::load(path)
                .with_context(|| format!("Failed to load model {}", path.display()))?,
        ),
        None => Arc::new(LexiconModel::from_schema(&schema)),
    };

    let engine = MappingEngine::with_config(schema, model, config);
    let source = JsonPointSource::new(points);
    let mut session = engine.open_from_source(site, &source, None).await?;

    let (handle, signal) = CancelHandle::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(category = "mapping", "Interrupt received, cancelling");
            handle.cancel();
        }
    });

    let report = engine.run(&mut session, &signal).await?;
    let result = MapOutput {
        session: session.info(),
        status: session.status(),
        graph: session.graph()?,
        report,
    };
    let json = serde_json::to_string_pretty(&result)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Mapped {} points: {} equipment, {} unresolved, {} violations -> {}",
                result.report.summary.points,
                result.report.summary.equipment,
                result.report.summary.unresolved,
                result.report.summary.violations,
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn run_features(points: &Path) -> Result<()> {
    let records = JsonPointSource::new(points).enumerate().await?;
    let extractor = FeatureExtractor::new();
    let vectors: Vec<_> = records.iter().map(|r| extractor.extract(r)).collect();
    println!("{}", serde_json::to_string_pretty(&vectors)?);
    Ok(())
}

fn run_schema(path: &Path) -> Result<()> {
    let schema = OntologySchema::load(path)
        .with_context(|| format!("Failed to load schema {}", path.display()))?;
    let issues = schema.check();

    println!("Schema: {} v{}", schema.name, schema.version);
    println!("  Point types:        {}", schema.point_types.len());
    println!("  Equipment types:    {}", schema.equipment_types.len());
    println!("  Relationship kinds: {}", schema.relationship_kinds.len());

    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("  {}: {}", issue.owner, issue.message);
        }
        bail!("schema has {} issue(s)", issues.len());
    }
    println!("No issues found");
    Ok(())
}
