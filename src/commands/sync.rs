use std::path::Path;

use anyhow::Result;
use contact_dates_core::{RunState, run_sync};
use owo_colors::OwoColorize;

use super::RunContext;

pub async fn run(config_path: &Path, dry_run: bool) -> Result<()> {
    let ctx = RunContext::load(config_path, dry_run).await?;

    let report = run_sync(&ctx.config, &ctx.directory, &ctx.calendar).await;
    let stats = report.stats;

    let created_label = if ctx.config.dry_run { "to create" } else { "created" };
    println!(
        "\n{} processed, {} {}, {} skipped, {}",
        stats.processed,
        stats.created.green(),
        created_label,
        stats.skipped.dimmed(),
        if stats.errors > 0 {
            format!("{} errors", stats.errors).red().to_string()
        } else {
            "0 errors".to_string()
        }
    );

    match report.state {
        RunState::Completed => Ok(()),
        RunState::Aborted(reason) => anyhow::bail!("Sync stopped early: {}", reason),
    }
}
