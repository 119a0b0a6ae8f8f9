use std::path::Path;

use anyhow::{Context, Result};
use contact_dates_core::event::ReminderMethod;
use contact_dates_core::format::format_minutes;
use owo_colors::OwoColorize;

use crate::config::{DEFAULT_CONFIG, FileConfig};

pub fn init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}\n\
            Pass --force to overwrite it",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file at {}", config_path.display()))?;

    println!("Wrote {}", config_path.display());
    println!("\nNext: run `contact-dates auth`, then fill in google_account and calendar_id.");

    Ok(())
}

pub fn show(config_path: &Path) -> Result<()> {
    let file = FileConfig::load(config_path)?;
    let config = file.run_config();

    println!("{}", "Paths".bold());
    println!("  Config:       {}", config_path.display());
    println!("  Credentials:  {}", contact_dates_google::app_config::credentials_path()?.display());

    println!("\n{}", "Target".bold());
    println!("  Account:      {}", or_unset(&file.google_account));
    if config.target.is_structural() {
        println!("  Calendar:     primary (birthday events)");
    } else {
        println!("  Calendar:     {}", or_unset(config.target.calendar_id()));
    }

    println!("\n{}", "Contacts".bold());
    println!("  Only birthdays:  {}", config.only_birthdays);
    println!(
        "  Label:           {}",
        config.required_label.as_deref().unwrap_or("(any)")
    );
    println!("  Months:          {}", list_or_all(&config.date_filter.months));
    println!("  Days:            {}", list_or_all(&config.date_filter.days));

    println!("\n{}", "Events".bold());
    println!("  Birthday title:  {}", config.templates.birthday_title);
    println!("  Special title:   {}", config.templates.special_event_title);
    println!("  No-label title:  {}", config.templates.no_label_title);
    if let Some(description) = &config.templates.birthday_description {
        println!("  Birthday desc:   {}", description);
    }
    if let Some(description) = &config.templates.special_event_description {
        println!("  Special desc:    {}", description);
    }

    println!("\n{}", "Reminders".bold());
    if config.reminders.uses_default() {
        println!("  Calendar defaults");
    }
    for reminder in config.reminders.overrides() {
        let method = match reminder.method {
            ReminderMethod::Popup => "Popup",
            ReminderMethod::Email => "Email",
        };
        println!("  {}: {} before", method, format_minutes(reminder.minutes));
    }

    println!("\n{}", "Deletion".bold());
    println!(
        "  Extra pattern:   {}",
        config.delete_pattern.as_deref().unwrap_or("(none)")
    );
    println!("  Future only:     {}", config.delete_only_future);

    if config.dry_run {
        println!("\n{}", "Dry run is on: nothing will be changed".yellow());
    }

    if let Err(e) = config.validate() {
        println!("\n{} {}", "Warning:".yellow().bold(), e);
        println!("  sync and delete will refuse to run until this is fixed");
    }

    Ok(())
}

fn or_unset(value: &str) -> &str {
    if value.trim().is_empty() { "(not set)" } else { value }
}

fn list_or_all(values: &std::collections::BTreeSet<u32>) -> String {
    if values.is_empty() {
        return "all".to_string();
    }
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
