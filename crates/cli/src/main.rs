//! Cadence CLI entry point.
//!
//! This binary is the composition root. It:
//!
//! 1. parses flags and loads `cadence.toml`,
//! 2. installs the tracing subscriber (and OTLP export when configured),
//! 3. builds the infrastructure adapters a command needs and hands them to
//!    the orchestration layer,
//! 4. prints the command's JSON result to stdout, and optionally to a file.
//!
//! The process exits non-zero whenever the result's `status` is `"error"`.

mod commands;
mod config;
mod telemetry;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use nodes::RunMode;
use pipeline::MAX_PREVIEW_WEEKS;
use serde_json::json;
use tracing::error;

use crate::commands::{CommandOutput, Context};
use crate::config::CadenceConfig;
use crate::telemetry::LogFormat;

/// Rotating social publisher for newsletter articles.
#[derive(Debug, Parser)]
#[command(name = "cadence", version, about, long_about = None)]
struct Cli {
    /// Path to `cadence.toml`. Defaults are used when omitted.
    #[arg(long, env = "CADENCE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Rotation state file; overrides `[state] path`.
    #[arg(long, env = "CADENCE_STATE_PATH", global = true)]
    state: Option<PathBuf>,

    /// Newsletter document id; overrides `[source] document_id`.
    #[arg(long, env = "CADENCE_DOCUMENT_ID", global = true)]
    document_id: Option<String>,

    /// Log line format on stderr.
    #[arg(long, value_enum, env = "CADENCE_LOG_FORMAT", default_value = "pretty", global = true)]
    log_format: LogFormat,

    /// Also write the JSON result to this file.
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Show the rotation pointer, counters, cached articles and next slot.
    Status,
    /// Compose the current post without writing anything.
    Preview,
    /// Compose the current post and persist caches; the pointer does not move.
    Generate,
    /// Compose, publish, and advance the rotation.
    Publish,
    /// Preview the posts of the coming weeks without advancing.
    PipelinePreview {
        /// Number of weekly slots to preview.
        #[arg(
            long,
            default_value_t = 3,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_PREVIEW_WEEKS))
        )]
        weeks: u32,
    },
    /// Fetch the document and report per-article validation.
    Validate,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _telemetry = match telemetry::init(cli.log_format) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let output_path = cli.output.clone();
    let output = match dispatch(cli).await {
        Ok(output) => output,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Command failed");
            CommandOutput {
                success: false,
                body: json!({ "status": "error", "reason": format!("{e:#}") }),
            }
        }
    };

    if let Err(e) = emit(&output, output_path) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }
    if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn dispatch(cli: Cli) -> Result<CommandOutput> {
    let config = CadenceConfig::load(cli.config.as_deref())?;
    let ctx = Context {
        state_path: cli.state.unwrap_or_else(|| config.state.path.clone()),
        document_id: cli.document_id,
        config,
    };

    match cli.command {
        Command::Status => commands::status(&ctx).await,
        Command::Preview => commands::run_cycle(&ctx, RunMode::Preview).await,
        Command::Generate => commands::run_cycle(&ctx, RunMode::Generate).await,
        Command::Publish => commands::run_cycle(&ctx, RunMode::Publish).await,
        Command::PipelinePreview { weeks } => commands::pipeline_preview(&ctx, weeks).await,
        Command::Validate => commands::validate(&ctx).await,
    }
}

fn emit(output: &CommandOutput, path: Option<PathBuf>) -> Result<()> {
    let text = serde_json::to_string_pretty(&output.body).context("failed to encode result")?;
    println!("{text}");
    if let Some(path) = path {
        std::fs::write(&path, format!("{text}\n"))
            .with_context(|| format!("failed to write result to {}", path.display()))?;
    }
    Ok(())
}
