//! Groups command - list eligible directory groups.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use jit_eligibility::GroupSet;
use jit_types::Provider;

use super::{Context, print_degraded};

/// Arguments for the groups command.
#[derive(Args, Debug)]
pub struct GroupsArgs {
    /// Only query this provider (default: [defaults].provider, else all)
    #[arg(short, long)]
    pub provider: Option<Provider>,
}

/// Run the groups command.
pub async fn run(args: GroupsArgs, ctx: &Context) -> Result<()> {
    let broker = ctx.connect()?;

    let mut output = match ctx.provider_or_default(args.provider) {
        Some(provider) => {
            let groups =
                jit_eligibility::eligible_groups(&ctx.call, broker.groups.as_ref(), provider).await?;
            GroupSet::single(provider, groups)
        }
        None => {
            jit_eligibility::eligible_groups_across(&ctx.call, broker.groups, &ctx.providers())
                .await?
        }
    };
    output.sort();

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();

    println!();
    println!("{}", style("Eligible Groups").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();

    if output.groups.is_empty() {
        println!("  {}", dim.apply_to("No eligible groups"));
    }

    for tagged in &output.groups {
        let group = &tagged.item;
        let detail = match &group.directory_name {
            Some(directory) => format!("{} ({})", group.group_id, directory),
            None => group.group_id.clone(),
        };
        println!(
            "  [{}] {}  {}",
            tagged.provider.display_name(),
            group.display_name,
            dim.apply_to(detail)
        );
    }

    print_degraded(&output.degraded);
    println!();

    Ok(())
}
