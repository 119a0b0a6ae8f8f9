//! Title and description templates.

pub const NAME_PLACEHOLDER: &str = "{name}";
pub const EVENT_TYPE_PLACEHOLDER: &str = "{eventType}";

pub const DEFAULT_BIRTHDAY_TITLE: &str = "{name}'s Birthday";
pub const DEFAULT_SPECIAL_EVENT_TITLE: &str = "{name}'s {eventType}";
pub const DEFAULT_BIRTHDAY_DESCRIPTION: &str = "Birthday celebration for {name}";
pub const DEFAULT_SPECIAL_EVENT_DESCRIPTION: &str = "{eventType} for {name}";
pub const DEFAULT_NO_LABEL_TITLE: &str = "Special Event";

/// Event type label used for birthdays.
pub const BIRTHDAY_LABEL: &str = "Birthday";

/// Substitute `{name}` and `{eventType}` into `template`.
pub fn format_template(template: &str, name: &str, event_type: &str) -> String {
    template
        .replace(NAME_PLACEHOLDER, name)
        .replace(EVENT_TYPE_PLACEHOLDER, event_type)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub birthday_title: String,
    pub special_event_title: String,
    /// `None` disables descriptions on created events
    pub birthday_description: Option<String>,
    pub special_event_description: Option<String>,
    /// Event type used when a custom event carries no label
    pub no_label_title: String,
}

impl Default for Templates {
    fn default() -> Self {
        Templates {
            birthday_title: DEFAULT_BIRTHDAY_TITLE.to_string(),
            special_event_title: DEFAULT_SPECIAL_EVENT_TITLE.to_string(),
            birthday_description: None,
            special_event_description: None,
            no_label_title: DEFAULT_NO_LABEL_TITLE.to_string(),
        }
    }
}

impl Templates {
    /// The label a custom event is titled with.
    pub fn event_type<'a>(&'a self, label: Option<&'a str>) -> &'a str {
        label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(self.no_label_title.as_str())
    }

    pub fn birthday_title(&self, name: &str) -> String {
        format_template(&self.birthday_title, name, BIRTHDAY_LABEL)
    }

    pub fn special_event_title(&self, name: &str, label: Option<&str>) -> String {
        format_template(&self.special_event_title, name, self.event_type(label))
    }

    pub fn birthday_description(&self, name: &str) -> Option<String> {
        self.birthday_description
            .as_deref()
            .map(|t| format_template(t, name, BIRTHDAY_LABEL))
    }

    pub fn special_event_description(&self, name: &str, label: Option<&str>) -> Option<String> {
        self.special_event_description
            .as_deref()
            .map(|t| format_template(t, name, self.event_type(label)))
    }
}

/// Human readable lead time: "30 minutes", "1 hour", "12 hours", "2 days".
pub fn format_minutes(minutes: u32) -> String {
    match minutes {
        m if m < 60 => format!("{m} minutes"),
        60 => "1 hour".to_string(),
        m if m < 1440 => format!("{} hours", f64::from(m) / 60.0),
        1440 => "1 day".to_string(),
        m => format!("{} days", f64::from(m) / 1440.0),
    }
}
