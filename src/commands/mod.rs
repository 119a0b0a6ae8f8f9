pub mod auth;
pub mod config;
pub mod delete;
pub mod sync;

use std::path::Path;

use anyhow::Result;
use contact_dates_core::RunConfig;
use contact_dates_google::{GoogleCalendar, PeopleDirectory};
use tracing::debug;

use crate::config::FileConfig;

/// Everything a sync or delete run needs.
pub struct RunContext {
    pub config: RunConfig,
    pub directory: PeopleDirectory,
    pub calendar: GoogleCalendar,
}

impl RunContext {
    /// Load the config file and open the Google services. `--dry-run` can only
    /// turn dry run on, never off.
    pub async fn load(config_path: &Path, dry_run: bool) -> Result<Self> {
        let file = FileConfig::load(config_path)?;
        let account = file.require_account()?.to_string();
        debug!(path = %config_path.display(), account = %account, "Loaded config");

        let mut config = file.into_run_config()?;
        config.dry_run |= dry_run;

        let (directory, calendar) = contact_dates_google::connect(&account).await?;

        Ok(RunContext {
            config,
            directory,
            calendar,
        })
    }
}
