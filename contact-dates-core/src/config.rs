//! Immutable per-run configuration.
//!
//! Built once by the caller (the CLI loads it from TOML) and passed by
//! reference into every component. Nothing in the engine reads ambient state.

use std::collections::BTreeSet;

use crate::error::ConfigError;
use crate::event::ReminderSetting;
use crate::filter::DateFilter;
use crate::format::Templates;

/// The calendar alias of the account's main calendar, which hosts the
/// built-in birthday surface.
pub const PRIMARY_CALENDAR_ID: &str = "primary";

/// Contacts fetched per directory page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Destination calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The primary calendar, writing structural "birthday" typed events
    Structural,
    /// A regular calendar, writing plain recurring events
    Calendar(String),
}

impl Target {
    pub fn calendar_id(&self) -> &str {
        match self {
            Target::Structural => PRIMARY_CALENDAR_ID,
            Target::Calendar(id) => id,
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Target::Structural)
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target: Target,
    /// Only process contacts carrying this label id
    pub required_label: Option<String>,
    pub only_birthdays: bool,
    pub templates: Templates,
    pub reminders: ReminderSetting,
    pub date_filter: DateFilter,
    /// Extra text pattern for the deletion sweep
    pub delete_pattern: Option<String>,
    pub delete_only_future: bool,
    pub dry_run: bool,
    pub page_size: u32,
}

impl RunConfig {
    pub fn new(target: Target) -> Self {
        RunConfig {
            target,
            required_label: None,
            only_birthdays: false,
            templates: Templates::default(),
            reminders: ReminderSetting::UseDefault,
            date_filter: DateFilter::default(),
            delete_pattern: None,
            delete_only_future: false,
            dry_run: false,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Target::Calendar(id) = &self.target {
            if id.trim().is_empty() {
                return Err(ConfigError::MissingCalendarId);
            }
        }

        if self.required_label.as_deref().is_some_and(|l| l.trim().is_empty()) {
            return Err(ConfigError::MissingContactLabel);
        }

        if self.templates.no_label_title.trim().is_empty() {
            return Err(ConfigError::EmptyNoLabelTitle);
        }

        if let Some(&month) = self.date_filter.months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(ConfigError::InvalidMonth(month));
        }

        if let Some(&day) = self.date_filter.days.iter().find(|d| !(1..=31).contains(*d)) {
            return Err(ConfigError::InvalidDay(day));
        }

        if !(1..=1000).contains(&self.page_size) {
            return Err(ConfigError::InvalidPageSize(self.page_size));
        }

        Ok(())
    }
}

/// Collect an allow-list into a set (duplicates in config are harmless).
pub fn allow_set(values: &[u32]) -> BTreeSet<u32> {
    values.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_target_uses_primary() {
        assert_eq!(Target::Structural.calendar_id(), "primary");
        assert!(Target::Structural.is_structural());
        assert_eq!(Target::Calendar("abc".into()).calendar_id(), "abc");
    }

    #[test]
    fn test_validate_rejects_bad_filters() {
        let mut config = RunConfig::new(Target::Structural);
        config.date_filter.months = allow_set(&[1, 13]);
        assert_eq!(config.validate(), Err(ConfigError::InvalidMonth(13)));

        let mut config = RunConfig::new(Target::Structural);
        config.date_filter.days = allow_set(&[0]);
        assert_eq!(config.validate(), Err(ConfigError::InvalidDay(0)));
    }

    #[test]
    fn test_validate_requires_calendar_and_label() {
        let config = RunConfig::new(Target::Calendar(" ".into()));
        assert_eq!(config.validate(), Err(ConfigError::MissingCalendarId));

        let mut config = RunConfig::new(Target::Structural);
        config.required_label = Some(String::new());
        assert_eq!(config.validate(), Err(ConfigError::MissingContactLabel));

        assert_eq!(RunConfig::new(Target::Structural).validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_blank_no_label_title() {
        let mut config = RunConfig::new(Target::Calendar("cal".into()));
        config.templates.no_label_title = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptyNoLabelTitle));
    }
}
