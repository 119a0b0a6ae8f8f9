//! Label and date gates applied before any calendar call.

use std::collections::BTreeSet;

use crate::contact::{DateFact, LabelMembership};

/// Whether a contact passes the "only labelled contacts" restriction.
///
/// Directory group ids come back qualified (`contactGroups/abc123`), so the
/// configured id only has to be contained in one of them.
pub fn passes_label_gate(memberships: &[LabelMembership], required_label: Option<&str>) -> bool {
    match required_label {
        None => true,
        Some(label) => memberships.iter().any(|m| m.group_id.contains(label)),
    }
}

/// Month/day allow-lists. An empty list admits everything on its axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateFilter {
    pub months: BTreeSet<u32>,
    pub days: BTreeSet<u32>,
}

impl DateFilter {
    pub fn admit(&self, date: Option<&DateFact>) -> bool {
        admit(date, &self.months, &self.days)
    }
}

/// Both axes must admit; a missing date is never admitted.
pub fn admit(date: Option<&DateFact>, months: &BTreeSet<u32>, days: &BTreeSet<u32>) -> bool {
    let Some(date) = date else {
        return false;
    };

    let month_ok = months.is_empty() || months.contains(&date.month);
    let day_ok = days.is_empty() || days.contains(&date.day);

    month_ok && day_ok
}
