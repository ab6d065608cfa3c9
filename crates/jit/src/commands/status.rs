//! Status command - active elevations with names and remaining lifetime.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use console::{Style, style};
use jit_eligibility::{ProviderFailure, Remaining, format_duration, remaining_lifetime};
use jit_types::{Provider, Session, SharedSessionsSource};
use serde::Serialize;

use super::{Context, print_degraded};

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only show sessions on this provider
    #[arg(short, long)]
    pub provider: Option<Provider>,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    sessions: Vec<SessionStatus>,
    degraded: Vec<ProviderFailure>,
}

#[derive(Debug, Serialize)]
struct SessionStatus {
    #[serde(flatten)]
    session: Session,
    workspace_name: Option<String>,
    /// Seconds left, when the elevation time is known.
    remaining_secs: Option<u64>,
}

/// Run the status command.
pub async fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let broker = ctx.connect()?;
    let sessions: SharedSessionsSource = Arc::new(broker.client.clone());
    let providers = match args.provider {
        Some(provider) => vec![provider],
        None => ctx.providers(),
    };

    let report =
        jit_eligibility::sessions_with_names(&ctx.call, sessions, broker.cloud.clone(), &providers)
            .await?;

    let elevated_at = broker.store.session_timestamps();
    let now = Utc::now();

    let mut rows: Vec<(Session, Option<String>, Remaining)> = report
        .sessions
        .into_iter()
        .filter(|s| args.provider.is_none_or(|p| s.provider == p))
        .map(|session| {
            let name = report.workspace_names.get(&session.workspace_id).cloned();
            let remaining = remaining_lifetime(&session, elevated_at.get(&session.id).copied(), now);
            (session, name, remaining)
        })
        .collect();
    rows.sort_by(|a, b| (a.0.provider, &a.0.workspace_id).cmp(&(b.0.provider, &b.0.workspace_id)));

    if ctx.json_output {
        let output = StatusOutput {
            sessions: rows
                .into_iter()
                .map(|(session, workspace_name, remaining)| SessionStatus {
                    session,
                    workspace_name,
                    remaining_secs: match remaining {
                        Remaining::Known { remaining } => Some(remaining.as_secs()),
                        Remaining::Unknown { .. } => None,
                    },
                })
                .collect(),
            degraded: report.degraded,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let green = Style::new().green();
    let red = Style::new().red();

    println!();
    println!("{}", style("Active Elevations").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();

    if rows.is_empty() {
        println!("  {}", dim.apply_to("No active elevations"));
    }

    for (session, name, remaining) in &rows {
        let label = format!(
            "[{}] {} / {}",
            session.provider.display_name(),
            name.as_deref().unwrap_or(&session.workspace_id),
            session.role_name
        );
        let lifetime = match remaining {
            Remaining::Known { .. } if remaining.is_elapsed() => red.apply_to("expired".to_string()),
            Remaining::Known { remaining } => {
                green.apply_to(format!("{} left", format_duration(*remaining)))
            }
            Remaining::Unknown { total } => {
                dim.apply_to(format!("{} granted", format_duration(*total)))
            }
        };
        println!("  {}  {}  {}", label, lifetime, dim.apply_to(&session.id));
    }

    print_degraded(&report.degraded);
    println!();

    Ok(())
}
