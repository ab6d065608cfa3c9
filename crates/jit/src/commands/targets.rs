//! Targets command - list eligible workspaces and roles.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use jit_eligibility::TargetSet;
use jit_types::Provider;

use super::{Context, print_degraded};

/// Arguments for the targets command.
#[derive(Args, Debug)]
pub struct TargetsArgs {
    /// Only query this provider (default: [defaults].provider, else all)
    #[arg(short, long)]
    pub provider: Option<Provider>,
}

/// Run the targets command.
pub async fn run(args: TargetsArgs, ctx: &Context) -> Result<()> {
    let broker = ctx.connect()?;
    let requested = ctx.provider_or_default(args.provider);

    let mut targets =
        jit_eligibility::eligible_targets(&ctx.call, broker.cloud, requested, &ctx.providers())
            .await?;
    targets.sort();

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&targets)?);
        return Ok(());
    }

    let dim = Style::new().dim();

    println!();
    println!("{}", style("Eligible Targets").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();

    if targets.is_empty() {
        println!("  {}", dim.apply_to("No eligible targets"));
    }

    match &targets {
        TargetSet::Single { targets } => {
            for target in targets {
                print_target(
                    &target.display_label(),
                    &target.workspace_id,
                    target.directory_name.as_deref(),
                );
            }
        }
        TargetSet::Tagged { targets, .. } => {
            for tagged in targets {
                print_target(
                    &tagged.display_label(),
                    &tagged.item.workspace_id,
                    tagged.item.directory_name.as_deref(),
                );
            }
        }
    }

    print_degraded(targets.degraded());
    println!();

    Ok(())
}

fn print_target(label: &str, workspace_id: &str, directory: Option<&str>) {
    let dim = Style::new().dim();
    match directory {
        Some(directory) => println!(
            "  {}  {}",
            label,
            dim.apply_to(format!("{workspace_id} ({directory})"))
        ),
        None => println!("  {}  {}", label, dim.apply_to(workspace_id)),
    }
}
