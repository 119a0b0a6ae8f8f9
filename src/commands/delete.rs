use std::path::Path;

use anyhow::Result;
use contact_dates_core::{SweepOutcome, run_deletion_sweep};
use owo_colors::OwoColorize;

use super::RunContext;

pub async fn run(config_path: &Path, dry_run: bool) -> Result<()> {
    let ctx = RunContext::load(config_path, dry_run).await?;

    let outcome = run_deletion_sweep(&ctx.config, &ctx.directory, &ctx.calendar).await;

    match outcome {
        SweepOutcome::Completed { deleted } if ctx.config.dry_run => {
            println!("\n{} events would be deleted", deleted.yellow());
            Ok(())
        }
        SweepOutcome::Completed { deleted } => {
            println!("\n{} events deleted", deleted.green());
            Ok(())
        }
        SweepOutcome::TargetNotFound => {
            println!("{}", outcome.count());
            anyhow::bail!(
                "Calendar not found or invalid ID: {}",
                ctx.config.target.calendar_id()
            )
        }
    }
}
