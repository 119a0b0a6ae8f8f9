//! Directory-side records.
//!
//! Directory adapters convert their responses into these types; absent
//! fields are explicit `None`s rather than missing keys.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Name used when a contact has no display name.
pub const UNNAMED_CONTACT: &str = "Unnamed Contact";

/// A directory entry with its recurring dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Opaque directory id (e.g. `people/c123`)
    pub resource_name: String,
    pub display_name: Option<String>,
    pub memberships: Vec<LabelMembership>,
    pub dates: Vec<ContactDate>,
}

/// Membership of a contact in a label/group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMembership {
    pub group_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactKind {
    Birthday,
    Custom,
}

/// One dated entry on a contact. `date` is `None` when the directory holds
/// the entry without a usable month/day (free text birthdays, for example).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactDate {
    pub kind: FactKind,
    pub date: Option<DateFact>,
    /// Label of a custom event ("Anniversary", ...). Always `None` for birthdays.
    pub label: Option<String>,
}

/// A recurring month/day, optionally anchored to a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFact {
    pub month: u32,
    pub day: u32,
    pub year: Option<i32>,
}

impl ContactRecord {
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(UNNAMED_CONTACT)
    }

    pub fn birthdays(&self) -> impl Iterator<Item = &ContactDate> {
        self.dates.iter().filter(|d| d.kind == FactKind::Birthday)
    }

    pub fn custom_events(&self) -> impl Iterator<Item = &ContactDate> {
        self.dates.iter().filter(|d| d.kind == FactKind::Custom)
    }
}

impl DateFact {
    pub fn new(month: u32, day: u32, year: Option<i32>) -> Self {
        DateFact { month, day, year }
    }

    /// Resolve to a concrete start date.
    ///
    /// A missing year becomes `current_year`. Feb 29 without a year lands on
    /// the latest leap year not after `current_year`, so the leap-day rule is
    /// still chosen for it. Returns `None` for dates that do not exist.
    pub fn resolve(&self, current_year: i32) -> Option<NaiveDate> {
        match self.year {
            Some(year) => NaiveDate::from_ymd_opt(year, self.month, self.day),
            None if self.month == 2 && self.day == 29 => (current_year - 7..=current_year)
                .rev()
                .find_map(|y| NaiveDate::from_ymd_opt(y, 2, 29)),
            None => NaiveDate::from_ymd_opt(current_year, self.month, self.day),
        }
    }
}

impl From<NaiveDate> for DateFact {
    fn from(date: NaiveDate) -> Self {
        DateFact::new(date.month(), date.day(), Some(date.year()))
    }
}
