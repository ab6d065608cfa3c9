//! jit - just-in-time privilege elevation for cloud workspaces
//!
//! Main entry point for the jit CLI.

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use jit_types::CallContext;
use tokio_util::sync::CancellationToken;
use tracing::warn;

mod commands;

use commands::{cache, elevate, groups, revoke, status, targets};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// jit - just-in-time privilege elevation for cloud workspaces
#[derive(Parser)]
#[command(name = "jit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Broker URL (overrides [broker].url)
    #[arg(long, global = true, env = "JIT_BROKER_URL")]
    pub broker: Option<String>,

    /// Ignore cached eligibility and query the broker
    #[arg(long, global = true)]
    pub refresh: bool,

    /// Timeout in seconds for broker lookups (default: [broker].timeout_secs)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show active elevations and their remaining lifetime
    Status(status::StatusArgs),

    /// List workspaces and roles you can elevate into
    Targets(targets::TargetsArgs),

    /// List directory groups you can join
    Groups(groups::GroupsArgs),

    /// Request an elevation
    Elevate(elevate::ElevateArgs),

    /// Revoke active elevations
    Revoke(revoke::RevokeArgs),

    /// Inspect or clear the eligibility cache
    Cache(cache::CacheArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing: console (human-readable, stderr) + rotating JSON file
    let filter = if cli.verbose {
        "jit=debug,jit_client=debug,jit_eligibility=debug,jit_store=debug,info"
    } else {
        "jit=info,warn"
    };

    let log_dir = jit_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "jit.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "jit=trace,jit_client=trace,jit_config=trace,jit_eligibility=trace,jit_store=trace,info",
                )),
        )
        .init();

    let loaded = jit_config::load_config(None)?;
    for warning in &loaded.warnings {
        warn!("{}", warning);
    }
    let config = loaded.config;

    // Ctrl-C cancels every in-flight broker call.
    let cancellation = CancellationToken::new();
    {
        let cancellation = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancellation.cancel();
            }
        });
    }

    let timeout = cli
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.broker().timeout());

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        refresh: cli.refresh,
        broker_url: cli.broker,
        timeout,
        call: CallContext::with_cancellation(cancellation).with_timeout(timeout),
        config,
    };

    match cli.command {
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Targets(args) => targets::run(args, &ctx).await,
        Commands::Groups(args) => groups::run(args, &ctx).await,
        Commands::Elevate(args) => elevate::run(args, &ctx).await,
        Commands::Revoke(args) => revoke::run(args, &ctx).await,
        Commands::Cache(args) => cache::run(args, &ctx).await,
    }
}
