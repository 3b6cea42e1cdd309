//! Climate Policy Maker - report generator
//!
//! Reads an already-fetched weather payload, evaluates the rule catalog and
//! writes a policy report, optionally followed by an LLM narrative.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use climate_policy_backend::external::PolicyLlmClient;
use climate_policy_backend::services::{export, CatalogStore, ExportFormat, PolicyService};
use climate_policy_backend::{AppError, AppResult, Config};
use shared::ChartRef;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "cpm-report", version, about = "Generate a climate policy report from a weather payload")]
struct Args {
    /// Weather payload (JSON)
    payload: PathBuf,

    /// Chart image as `title=path`; repeatable
    #[arg(long = "chart", value_name = "TITLE=PATH")]
    charts: Vec<String>,

    /// Export format: markdown, json or csv
    #[arg(long, short)]
    format: Option<String>,

    /// Output directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Overlay rule catalog (TOML)
    #[arg(long, env = "CPM_CATALOG__PATH")]
    catalog: Option<String>,

    /// Skip the built-in rules
    #[arg(long)]
    no_builtin: bool,

    /// Prompt for the optional policy elaboration
    #[arg(long)]
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cpm_report=debug,climate_policy_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if let Err(err) = run(args).await {
        let response = err.into_response();
        eprintln!("{}", serde_json::to_string_pretty(&response)?);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(args: Args) -> AppResult<()> {
    let mut config = Config::load()?;
    if args.catalog.is_some() {
        config.catalog.path = args.catalog.clone();
    }
    if args.no_builtin {
        config.catalog.include_builtin = false;
    }

    tracing::info!("Starting Climate Policy Maker report generator");
    tracing::info!("Environment: {}", config.environment);

    let store = Arc::new(CatalogStore::load(&config.catalog)?);
    let llm = PolicyLlmClient::from_config(&config.elaboration)?;
    let service = PolicyService::new(store, llm);
    let active = service.catalog().current();
    tracing::info!(
        rules = active.len(),
        version = active.version().unwrap_or("unversioned"),
        "Rule catalog ready"
    );

    let raw = tokio::fs::read_to_string(&args.payload).await?;
    let payload: serde_json::Value = serde_json::from_str(&raw)?;

    let mut charts = Vec::with_capacity(args.charts.len());
    for arg in &args.charts {
        charts.push(load_chart(arg).await?);
    }

    let report = service.build_report(&payload, &charts)?;

    let format: ExportFormat = args
        .format
        .as_deref()
        .unwrap_or(config.report.format.as_str())
        .parse()?;
    let out_dir = args
        .out_dir
        .unwrap_or_else(|| PathBuf::from(&config.report.output_dir));
    let path = export::write_report(&report, format, &out_dir).await?;
    println!("{}", path.display());

    if let Some(narrative) = service.elaborate(args.prompt.as_deref(), &report).await? {
        let narrative_path = path.with_extension("narrative.md");
        tokio::fs::write(&narrative_path, &narrative.content).await?;
        tracing::info!(path = %narrative_path.display(), model = %narrative.model, "Narrative written");
        println!("{}", narrative_path.display());
    }

    Ok(())
}

/// Parse `title=path` and read the image. Unreadable files are kept as
/// path references so the report shows them as unavailable or linked.
async fn load_chart(arg: &str) -> AppResult<ChartRef> {
    let (title, path) = match arg.split_once('=') {
        Some((title, path)) => (title.trim().to_string(), path.trim()),
        None => {
            let stem = Path::new(arg)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(arg)
                .to_string();
            (stem, arg.trim())
        }
    };
    if path.is_empty() {
        return Err(AppError::Validation {
            field: "chart".to_string(),
            message: format!("Chart '{}' has no path", title),
        });
    }

    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(ChartRef::from_bytes(title, bytes)),
        Err(e) => {
            tracing::warn!(chart = %title, path, error = %e, "Chart file unreadable, linking by path");
            Ok(ChartRef::from_path(title, path))
        }
    }
}
