//! interview-assessor binary
//!
//! Runs the assessment HTTP API, or assesses a single submission file from
//! the command line against the configured analysis services.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use interview_assessor::api::{create_app, ApiState};
use interview_assessor::config::{validation, AssessConfig};
use interview_assessor::media::HttpMediaFetcher;
use interview_assessor::notify::WebhookNotifier;
use interview_assessor::pipeline::AssessmentPipeline;
use interview_assessor::stages::{AnalysisSuite, HttpAnalysisClient};
use interview_assessor::types::{QuestionSet, Submission};
use interview_assessor::workspace::DirWorkspaceProvider;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "interview-assessor")]
#[command(about = "Screening-interview assessment service")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides ASSESSOR_CONFIG and ./assessor.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Run the HTTP API (default)
    Serve {
        /// Override the server address (default from config: "0.0.0.0:8080")
        #[arg(short, long, value_name = "HOST:PORT")]
        addr: Option<String>,
    },

    /// Assess one submission JSON file and print the report
    Assess {
        /// Submission JSON (candidate, media refs, optional question set)
        #[arg(long, value_name = "FILE")]
        submission: PathBuf,
        /// Write the report here instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Validate the configuration and print the effective values
    CheckConfig,

    /// Print the default question set as JSON
    Questions,
}

// ============================================================================
// Setup
// ============================================================================

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> Result<AssessConfig> {
    match path {
        Some(p) => AssessConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => AssessConfig::load().context("Invalid assessor configuration"),
    }
}

fn build_pipeline(config: &AssessConfig) -> Result<AssessmentPipeline> {
    let client = HttpAnalysisClient::new(&config.services)
        .context("Failed to build analysis service client")?;
    let fetcher = HttpMediaFetcher::new(&config.media).context("Failed to build media fetcher")?;
    let provider = DirWorkspaceProvider::new(config.workspace.root_dir());
    let notifier =
        WebhookNotifier::from_config(&config.webhook).context("Failed to build webhook client")?;

    info!(
        services = %config.services.base_url,
        media = %config.media.gcs_base_url,
        workspace_root = %provider.root().display(),
        webhook = notifier.is_some(),
        "Pipeline configured"
    );
    let suite = AnalysisSuite::from_http(client, Arc::new(fetcher));
    Ok(AssessmentPipeline::new(suite, Arc::new(provider)).with_notifier(notifier))
}

// ============================================================================
// Subcommands
// ============================================================================

async fn run_server(config: AssessConfig, addr: Option<String>) -> Result<()> {
    let server_addr = addr.unwrap_or_else(|| config.server.addr.clone());
    let pipeline = build_pipeline(&config)?;
    let app = create_app(ApiState::new(pipeline, config));

    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {server_addr}"))?;
    info!("HTTP server listening on {}", server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received Ctrl+C, shutting down");
        })
        .await
        .context("HTTP server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn run_assess(config: AssessConfig, submission: &Path, output: Option<&Path>) -> Result<()> {
    let raw = std::fs::read_to_string(submission)
        .with_context(|| format!("Failed to read {}", submission.display()))?;
    let submission: Submission =
        serde_json::from_str(&raw).context("Submission is not valid JSON")?;

    let pipeline = build_pipeline(&config)?;
    let report = pipeline
        .assess(submission, &config)
        .await
        .context("Assessment did not produce a decision")?;

    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), verdict = %report.decision.verdict, "Report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_check_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    for w in validation::validate_scoring_sanity(&config) {
        warn!(field = %w.field, "{}", w);
    }
    println!("{}", config.to_toml()?);
    info!("Configuration is valid");
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.json_logs);

    match args.command.unwrap_or(SubCommand::Serve { addr: None }) {
        SubCommand::Serve { addr } => run_server(load_config(args.config.as_deref())?, addr).await,
        SubCommand::Assess { submission, output } => {
            let config = load_config(args.config.as_deref())?;
            run_assess(config, &submission, output.as_deref()).await
        }
        SubCommand::CheckConfig => run_check_config(args.config.as_deref()),
        SubCommand::Questions => {
            println!("{}", serde_json::to_string_pretty(&QuestionSet::ambassador_program())?);
            Ok(())
        }
    }
}
