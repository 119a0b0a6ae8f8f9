use anyhow::Result;
use contact_dates_google::{app_config, auth};
use owo_colors::OwoColorize;

pub async fn run() -> Result<()> {
    let creds = app_config::load()?;

    println!("Authenticating with Google...");

    let account = auth::authenticate(&creds).await?;

    println!("\nAuthenticated as: {}", account.green());
    println!("\nNow set the account in your config.toml:");
    println!();
    println!("google_account = \"{}\"", account);
    println!();
    println!("Then run `contact-dates sync --dry-run` to preview the events.");

    Ok(())
}
