use anyhow::{Context, Result};
use contact_dates_core::config::allow_set;
use contact_dates_core::event::ReminderSetting;
use contact_dates_core::format::{
    DEFAULT_BIRTHDAY_DESCRIPTION, DEFAULT_BIRTHDAY_TITLE, DEFAULT_NO_LABEL_TITLE,
    DEFAULT_SPECIAL_EVENT_DESCRIPTION, DEFAULT_SPECIAL_EVENT_TITLE, Templates,
};
use contact_dates_core::{RunConfig, Target};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings file, `~/.config/contact-dates/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Google account whose contacts and calendars are used
    pub google_account: String,

    /// Write birthday-typed events into the primary calendar
    pub use_birthday_calendar: bool,
    pub calendar_id: String,

    /// Event type used for custom events without a label
    pub no_label_title: String,
    pub only_birthdays: bool,

    pub only_contact_label: bool,
    pub contact_label_id: String,

    pub use_default_reminders: bool,
    /// Minutes before the event, 0 disables the slot
    pub email_reminders: Vec<u32>,
    pub popup_reminders: Vec<u32>,

    pub dry_run: bool,

    /// Empty means the built-in format
    pub birthday_title_format: String,
    pub special_event_title_format: String,

    pub add_custom_descriptions: bool,
    pub birthday_description: String,
    pub special_event_description: String,

    pub filter_months: Vec<u32>,
    pub filter_days: Vec<u32>,

    pub delete_search_pattern: String,
    pub delete_only_future_events: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        FileConfig {
            google_account: String::new(),
            use_birthday_calendar: false,
            calendar_id: String::new(),
            no_label_title: DEFAULT_NO_LABEL_TITLE.to_string(),
            only_birthdays: false,
            only_contact_label: false,
            contact_label_id: String::new(),
            use_default_reminders: true,
            email_reminders: vec![0, 0],
            popup_reminders: vec![720, 0],
            dry_run: false,
            birthday_title_format: String::new(),
            special_event_title_format: String::new(),
            add_custom_descriptions: false,
            birthday_description: DEFAULT_BIRTHDAY_DESCRIPTION.to_string(),
            special_event_description: DEFAULT_SPECIAL_EVENT_DESCRIPTION.to_string(),
            filter_months: vec![],
            filter_days: vec![],
            delete_search_pattern: String::new(),
            delete_only_future_events: false,
        }
    }
}

/// Get the config directory path (~/.config/contact-dates)
pub fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("contact-dates"))
}

/// Get the default config file path (~/.config/contact-dates/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Resolve `--config`, falling back to the default location.
pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => config_path(),
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Config file not found at {}\n\n\
                Create one with:\n  \
                contact-dates config init",
                path.display()
            );
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn require_account(&self) -> Result<&str> {
        let account = self.google_account.trim();
        if account.is_empty() {
            anyhow::bail!(
                "google_account is not set.\n\n\
                Run `contact-dates auth` and put the printed account in config.toml"
            );
        }
        Ok(account)
    }

    pub fn target(&self) -> Target {
        if self.use_birthday_calendar {
            Target::Structural
        } else {
            Target::Calendar(self.calendar_id.trim().to_string())
        }
    }

    pub fn reminders(&self) -> ReminderSetting {
        ReminderSetting::from_slots(
            self.use_default_reminders,
            &self.popup_reminders,
            &self.email_reminders,
        )
    }

    fn templates(&self) -> Templates {
        let or_default = |value: &str, default: &str| {
            if value.trim().is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        };

        let descriptions = self.add_custom_descriptions;

        Templates {
            birthday_title: or_default(&self.birthday_title_format, DEFAULT_BIRTHDAY_TITLE),
            special_event_title: or_default(&self.special_event_title_format, DEFAULT_SPECIAL_EVENT_TITLE),
            birthday_description: descriptions.then(|| self.birthday_description.clone()),
            special_event_description: descriptions.then(|| self.special_event_description.clone()),
            no_label_title: or_default(&self.no_label_title, DEFAULT_NO_LABEL_TITLE),
        }
    }

    /// Build the engine's run configuration without validating it.
    pub fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::new(self.target());

        config.required_label = self
            .only_contact_label
            .then(|| self.contact_label_id.trim().to_string());
        config.only_birthdays = self.only_birthdays;
        config.templates = self.templates();
        config.reminders = self.reminders();
        config.date_filter.months = allow_set(&self.filter_months);
        config.date_filter.days = allow_set(&self.filter_days);
        config.delete_pattern = Some(self.delete_search_pattern.trim().to_string()).filter(|p| !p.is_empty());
        config.delete_only_future = self.delete_only_future_events;
        config.dry_run = self.dry_run;
        config
    }

    /// Validate and build the engine's run configuration.
    pub fn into_run_config(self) -> Result<RunConfig> {
        let config = self.run_config();
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// Written by `config init`.
pub const DEFAULT_CONFIG: &str = r#"# contact-dates configuration

# Google account to use (printed by `contact-dates auth`)
google_account = ""

# true: write birthday events into your primary calendar's birthday surface
# false: write plain recurring events into `calendar_id`
use_birthday_calendar = false
calendar_id = ""

# Title used for custom dates that have no label
no_label_title = "Special Event"

# Skip anniversaries and other custom dates
only_birthdays = false

# Only process contacts carrying this label (contact group id)
only_contact_label = false
contact_label_id = ""

# Reminders in minutes before the event, 0 disables a slot
use_default_reminders = true
email_reminders = [0, 0]
popup_reminders = [720, 0]

# Log what would be created or deleted without changing anything
dry_run = false

# Titles: {name} is the contact's name, {eventType} the date's label
birthday_title_format = "{name}'s Birthday"
special_event_title_format = "{name}'s {eventType}"

add_custom_descriptions = false
birthday_description = "Birthday celebration for {name}"
special_event_description = "{eventType} for {name}"

# Only process these months (1-12) / days (1-31); empty means all
filter_months = []
filter_days = []

# Deletion: extra text matched against event titles
delete_search_pattern = ""
delete_only_future_events = false
"#;
