//! Cache command - inspect and clear the eligibility cache.

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};
use jit_eligibility::format_duration;
use jit_store::StoreStats;
use serde::Serialize;

use super::Context;

/// Arguments for the cache command.
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: Option<CacheCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Show entry counts and freshness (default)
    Status,

    /// Remove all cached eligibility (elevation times are kept)
    Clear,

    /// Print the cache directory
    Path,
}

#[derive(Debug, Serialize)]
struct CacheStatusOutput {
    path: String,
    enabled: bool,
    #[serde(flatten)]
    stats: StoreStats,
}

/// Run the cache command.
pub async fn run(args: CacheArgs, ctx: &Context) -> Result<()> {
    match args.command.unwrap_or(CacheCommand::Status) {
        CacheCommand::Status => cmd_status(ctx),
        CacheCommand::Clear => cmd_clear(ctx),
        CacheCommand::Path => cmd_path(ctx),
    }
}

fn cmd_status(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let stats = store.stats()?;
    let output = CacheStatusOutput {
        path: store.root().display().to_string(),
        enabled: ctx.config.cache().enabled,
        stats,
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let stats = &output.stats;
    println!();
    println!("{}", style("Eligibility Cache").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    println!("  {} {}", dim.apply_to("Path:"), output.path);
    if !output.enabled {
        println!("  {} {}", dim.apply_to("State:"), Style::new().yellow().apply_to("disabled"));
    }
    println!(
        "  {} {} ({} fresh, {} stale)",
        dim.apply_to("Entries:"),
        stats.entries,
        stats.fresh,
        stats.stale
    );
    println!(
        "  {} {}",
        dim.apply_to("TTL:"),
        format_duration(Duration::from_secs(stats.ttl_secs))
    );
    println!("  {} {}", dim.apply_to("Tracked sessions:"), stats.sessions);
    println!();

    Ok(())
}

fn cmd_clear(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let removed = store.clear()?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else {
        println!("Removed {} cached {}", removed, if removed == 1 { "entry" } else { "entries" });
    }
    Ok(())
}

fn cmd_path(ctx: &Context) -> Result<()> {
    let dir = ctx.config.cache().effective_dir();
    if ctx.json_output {
        println!("{}", serde_json::json!({ "path": dir.display().to_string() }));
    } else {
        println!("{}", dir.display());
    }
    Ok(())
}
