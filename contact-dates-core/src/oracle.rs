//! Same-day, same-title existence check.

use chrono::{Days, NaiveDate};

use crate::error::{SyncError, SyncResult};
use crate::service::{CalendarService, Lookup};

/// Whether `calendar_id` already holds an event titled exactly `title` on `day`.
///
/// A missing calendar is `TargetNotFound` (fatal for the run); any other
/// lookup failure is a per-event `Lookup` error.
pub async fn event_exists<C: CalendarService + ?Sized>(
    calendar: &C,
    calendar_id: &str,
    day: NaiveDate,
    title: &str,
) -> SyncResult<bool> {
    let end = day.checked_add_days(Days::new(1)).unwrap_or(day);

    match calendar.list_day_events(calendar_id, day, end).await {
        Lookup::Found(events) => Ok(events.iter().any(|e| e.summary == title)),
        Lookup::Empty => Ok(false),
        Lookup::NotFound => Err(SyncError::TargetNotFound(calendar_id.to_string())),
        Lookup::Transient(msg) => Err(SyncError::Lookup(msg)),
    }
}
