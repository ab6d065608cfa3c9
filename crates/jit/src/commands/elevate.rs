//! Elevate command - request a time-boxed elevation.

use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use chrono::Utc;
use clap::Args;
use console::{Style, style};
use jit_client::ElevationRequest;
use jit_eligibility::{EligibilityError, TargetSet, format_duration};
use jit_types::{EligibleTarget, Provider, Tagged};
use tracing::{info, warn};

use super::{Context, print_degraded};

/// Arguments for the elevate command.
#[derive(Args, Debug)]
pub struct ElevateArgs {
    /// Workspace id or name (account, subscription or project)
    #[arg(short, long)]
    pub workspace: String,

    /// Role to assume
    #[arg(short, long)]
    pub role: String,

    /// Provider of the workspace (default: [defaults].provider, else search all)
    #[arg(short, long)]
    pub provider: Option<Provider>,

    /// Elevation length in seconds (default: [defaults].duration_secs)
    #[arg(short, long, value_name = "SECS")]
    pub duration: Option<u64>,

    /// Justification recorded with the elevation
    #[arg(long)]
    pub reason: Option<String>,
}

/// Run the elevate command.
pub async fn run(args: ElevateArgs, ctx: &Context) -> Result<()> {
    let broker = ctx.connect()?;
    let requested = ctx.provider_or_default(args.provider);

    let set =
        jit_eligibility::eligible_targets(&ctx.call, broker.cloud, requested, &ctx.providers())
            .await?;
    if set.is_empty() {
        return Err(EligibilityError::NoEligibleTargets.into());
    }
    if !ctx.json_output {
        print_degraded(set.degraded());
    }

    let candidates = match requested {
        Some(provider) => set.into_tagged(provider),
        None => match set {
            TargetSet::Tagged { targets, .. } => targets,
            TargetSet::Single { .. } => Vec::new(),
        },
    };
    let target = select_target(candidates, &args.workspace, &args.role)?;

    let duration_secs = args
        .duration
        .unwrap_or_else(|| ctx.config.defaults().duration_secs);
    if let Some(max) = target.item.max_duration_secs
        && duration_secs > max
    {
        bail!(
            "{} allows at most {}, requested {}",
            target.display_label(),
            format_duration(Duration::from_secs(max)),
            format_duration(Duration::from_secs(duration_secs))
        );
    }

    let mut request = ElevationRequest::new(
        target.provider,
        target.item.workspace_id.clone(),
        target.item.role_name.clone(),
        duration_secs,
    );
    if let Some(reason) = args.reason {
        request = request.with_reason(reason);
    }

    // Discovery may have used up most of the lookup deadline.
    let call = ctx.call.fresh_deadline(ctx.timeout);
    let session = broker
        .client
        .elevate(&call, &request)
        .await
        .with_context(|| format!("elevation into {} failed", target.display_label()))?;

    info!(session = %session.id, target = %target.display_label(), "Elevated");
    if let Err(e) = broker.store.record_session_timestamp(&session.id, Utc::now()) {
        warn!(session = %session.id, error = %e, "Failed to record elevation time");
    }

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    let green = Style::new().green();
    let dim = Style::new().dim();
    println!();
    println!(
        "  {} {} for {}",
        green.apply_to("✓"),
        style(target.display_label()).bold(),
        format_duration(Duration::from_secs(session.duration_secs))
    );
    println!("  {} {}", dim.apply_to("Session:"), session.id);
    println!();

    Ok(())
}

/// Pick the one target matching `workspace` (id, or name ignoring case) and `role`.
fn select_target(
    candidates: Vec<Tagged<EligibleTarget>>,
    workspace: &str,
    role: &str,
) -> Result<Tagged<EligibleTarget>> {
    let mut matches: Vec<_> = candidates
        .into_iter()
        .filter(|t| {
            (t.item.workspace_id == workspace || t.item.workspace_name.eq_ignore_ascii_case(workspace))
                && t.item.role_name.eq_ignore_ascii_case(role)
        })
        .collect();

    match matches.len() {
        0 => bail!("not eligible for role '{role}' on '{workspace}'. Run `jit targets` to list eligible targets"),
        1 => Ok(matches.remove(0)),
        _ => {
            let providers: Vec<String> = matches.iter().map(|t| t.provider.to_string()).collect();
            bail!(
                "'{workspace}' / '{role}' matches targets on several providers ({}); pass --provider",
                providers.join(", ")
            )
        }
    }
}
