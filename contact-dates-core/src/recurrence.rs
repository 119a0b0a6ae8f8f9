//! Annual recurrence rules for contact dates.

use std::fmt;

use chrono::{Datelike, NaiveDate};

/// An RRULE value (without the `RRULE:` prefix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule(String);

impl RecurrenceRule {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The rule as a recurrence line, e.g. `RRULE:FREQ=YEARLY`.
    pub fn to_line(&self) -> String {
        format!("RRULE:{}", self.0)
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RRULE:{}", self.0)
    }
}

/// Build the yearly rule for a series starting on `start`.
///
/// A plain yearly rule anchored on Feb 29 only fires in leap years, so that
/// date gets "last day of February" instead.
pub fn annual_rule(start: NaiveDate) -> RecurrenceRule {
    if start.month() == 2 && start.day() == 29 {
        RecurrenceRule("FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=-1".to_string())
    } else {
        RecurrenceRule("FREQ=YEARLY".to_string())
    }
}
