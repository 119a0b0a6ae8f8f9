//! Calendar-side event types.
//!
//! `TargetEvent` is what the engine writes; `CalendarEvent` is the slim view
//! of an existing event that lookups and the deletion sweep work with.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::recurrence::{RecurrenceRule, annual_rule};

/// Type marker of the calendar's built-in birthday events.
pub const BIRTHDAY_EVENT_TYPE: &str = "birthday";

/// Structural type of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Default,
    /// Built-in birthday surface of the destination
    Birthday,
    /// Any other provider type (out of office, focus time, ...)
    Other(String),
}

impl EventKind {
    pub fn from_type_marker(marker: &str) -> Self {
        match marker {
            "" | "default" => EventKind::Default,
            BIRTHDAY_EVENT_TYPE => EventKind::Birthday,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_type_marker(&self) -> &str {
        match self {
            EventKind::Default => "default",
            EventKind::Birthday => BIRTHDAY_EVENT_TYPE,
            EventKind::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMethod {
    Email,
    Popup,
}

/// A reminder override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub method: ReminderMethod,
    /// Minutes before the event to trigger
    pub minutes: u32,
}

/// How reminders are attached to created events.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReminderSetting {
    /// Leave it to the calendar's default notifications
    #[default]
    UseDefault,
    Overrides(Vec<Reminder>),
}

impl ReminderSetting {
    /// Build from the configured popup/email slots. Slots set to 0 are
    /// disabled; the order is popups first, then emails.
    pub fn from_slots(use_default: bool, popup: &[u32], email: &[u32]) -> Self {
        if use_default {
            return ReminderSetting::UseDefault;
        }

        let popups = popup.iter().map(|&minutes| Reminder {
            method: ReminderMethod::Popup,
            minutes,
        });
        let emails = email.iter().map(|&minutes| Reminder {
            method: ReminderMethod::Email,
            minutes,
        });

        ReminderSetting::Overrides(popups.chain(emails).filter(|r| r.minutes > 0).collect())
    }

    /// Explicit overrides to attach, empty when the calendar defaults apply.
    pub fn overrides(&self) -> &[Reminder] {
        match self {
            ReminderSetting::UseDefault => &[],
            ReminderSetting::Overrides(list) => list,
        }
    }

    pub fn uses_default(&self) -> bool {
        self.overrides().is_empty()
    }
}

/// The event the engine writes for one date fact.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetEvent {
    pub title: String,
    pub start: NaiveDate,
    /// Exclusive end, always the day after `start`
    pub end: NaiveDate,
    pub recurrence: RecurrenceRule,
    pub reminders: ReminderSetting,
    pub description: Option<String>,
    pub kind: EventKind,
}

impl TargetEvent {
    /// An all-day event on `start` repeating every year.
    pub fn annual(
        title: String,
        start: NaiveDate,
        reminders: ReminderSetting,
        description: Option<String>,
        kind: EventKind,
    ) -> Self {
        let end = start.checked_add_days(Days::new(1)).unwrap_or(start);

        TargetEvent {
            title,
            start,
            end,
            recurrence: annual_rule(start),
            reminders,
            description,
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transparency {
    Opaque,
    Transparent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Default,
    Private,
}

/// Payload for the structural birthday insert path.
///
/// Carries no description: the birthday event type rejects one.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralEvent {
    pub summary: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub kind: EventKind,
    pub recurrence: Vec<String>,
    pub transparency: Transparency,
    pub visibility: Visibility,
    pub reminders: ReminderSetting,
}

impl StructuralEvent {
    pub fn birthday(event: &TargetEvent) -> Self {
        StructuralEvent {
            summary: event.title.clone(),
            start: event.start,
            end: event.end,
            kind: EventKind::Birthday,
            recurrence: vec![event.recurrence.to_line()],
            transparency: Transparency::Transparent,
            visibility: Visibility::Private,
            reminders: event.reminders.clone(),
        }
    }

    /// Start as a date-only ISO string (`YYYY-MM-DD`).
    pub fn start_iso(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_iso(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// An existing event as seen by lookups and sweeps.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub kind: EventKind,
    pub start: Option<NaiveDate>,
}
