//! Revoke command - end active elevations early.

use anyhow::{Context as _, Result, bail};
use clap::Args;
use console::Style;
use jit_types::{Session, SessionsSource};
use serde::Serialize;
use tracing::info;

use super::{Context, print_degraded};

/// Arguments for the revoke command.
#[derive(Args, Debug)]
pub struct RevokeArgs {
    /// Session ids to revoke
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
struct RevokeOutput {
    revoked: Vec<String>,
    failed: Vec<RevokeFailure>,
}

#[derive(Debug, Serialize)]
struct RevokeFailure {
    id: String,
    error: String,
}

/// Run the revoke command.
pub async fn run(args: RevokeArgs, ctx: &Context) -> Result<()> {
    let broker = ctx.connect()?;

    let active = broker
        .client
        .active_sessions(&ctx.call, None)
        .await
        .context("failed to list active sessions")?;

    let unknown: Vec<&str> = args
        .ids
        .iter()
        .filter(|id| !active.iter().any(|s| &s.id == *id))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        bail!("no active session with id: {}", unknown.join(", "));
    }

    let selected: Vec<Session> = active
        .into_iter()
        .filter(|s| args.ids.contains(&s.id))
        .collect();
    let names = jit_eligibility::resolve_workspace_names(&ctx.call, broker.cloud.clone(), &selected).await;

    let green = Style::new().green();
    let red = Style::new().red();
    let dim = Style::new().dim();
    let mut output = RevokeOutput::default();

    if !ctx.json_output {
        print_degraded(&names.degraded);
        println!();
    }

    for session in &selected {
        let label = format!(
            "[{}] {} / {}",
            session.provider.display_name(),
            names.name_or_id(&session.workspace_id),
            session.role_name
        );
        let call = ctx.call.fresh_deadline(ctx.timeout);
        match broker.client.revoke(&call, &session.id).await {
            Ok(()) => {
                info!(session = %session.id, "Revoked");
                if !ctx.json_output {
                    println!("  {} {}  {}", green.apply_to("✓"), label, dim.apply_to(&session.id));
                }
                output.revoked.push(session.id.clone());
            }
            Err(e) if e.is_context_error() => return Err(e).context("revocation interrupted"),
            Err(e) => {
                if !ctx.json_output {
                    println!("  {} {}  {}", red.apply_to("✗"), label, dim.apply_to(&e));
                }
                output.failed.push(RevokeFailure {
                    id: session.id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!();
    }

    if !output.failed.is_empty() {
        bail!("{} of {} revocations failed", output.failed.len(), selected.len());
    }
    Ok(())
}
