//! User-provided OAuth credentials for the Google APIs.
//!
//! Stored at:
//!   ~/.config/contact-dates/google/app_config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Google OAuth client credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

pub fn base_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("contact-dates")
        .join("google"))
}

pub fn credentials_path() -> Result<PathBuf> {
    Ok(base_dir()?.join("app_config.toml"))
}

pub fn load() -> Result<Credentials> {
    let path = credentials_path()?;

    if !path.exists() {
        anyhow::bail!(
            "Google credentials not found.\n\n\
            Create {} with:\n\n\
            client_id = \"your-client-id.apps.googleusercontent.com\"\n\
            client_secret = \"your-client-secret\"\n\n\
            The OAuth client needs the Calendar and People APIs enabled.\n\
            See https://console.cloud.google.com/apis/credentials for setup.",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read credentials from {}", path.display()))?;

    parse(&contents).with_context(|| format!("Failed to parse credentials from {}", path.display()))
}

fn parse(contents: &str) -> Result<Credentials> {
    let creds: Credentials = toml::from_str(contents)?;

    if creds.client_id.trim().is_empty() || creds.client_secret.trim().is_empty() {
        anyhow::bail!("client_id and client_secret must not be empty");
    }

    Ok(creds)
}
