//! Capability interfaces for the two remote services.
//!
//! The engine only talks to the directory and the calendar through these
//! traits. Adapters translate transport failures into [`ServiceError`] so
//! callers branch on variants instead of message text.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::contact::ContactRecord;
use crate::event::{CalendarEvent, Reminder, StructuralEvent};
use crate::recurrence::RecurrenceRule;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// The addressed resource (calendar, event) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport failure or server error; retrying may help
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The service understood the request and refused it
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// One page of directory contacts.
#[derive(Debug, Clone, Default)]
pub struct ContactPage {
    pub contacts: Vec<ContactRecord>,
    pub next_page_token: Option<String>,
}

/// One page of calendar events.
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub events: Vec<CalendarEvent>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarHandle {
    pub id: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHandle {
    pub id: String,
}

/// Result of listing the events of one day.
///
/// "No events" and "no calendar" are different answers: the first is a normal
/// `Empty`, the second means the destination is misconfigured.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Vec<CalendarEvent>),
    Empty,
    NotFound,
    Transient(String),
}

impl From<Result<Vec<CalendarEvent>, ServiceError>> for Lookup {
    fn from(result: Result<Vec<CalendarEvent>, ServiceError>) -> Self {
        match result {
            Ok(events) if events.is_empty() => Lookup::Empty,
            Ok(events) => Lookup::Found(events),
            Err(ServiceError::NotFound(_)) => Lookup::NotFound,
            Err(e) => Lookup::Transient(e.to_string()),
        }
    }
}

#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Fetch one page of connections with names, birthdays, custom events and
    /// group memberships.
    async fn list_connections(
        &self,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<ContactPage, ServiceError>;
}

#[async_trait]
pub trait CalendarService: Send + Sync {
    async fn get_calendar(&self, calendar_id: &str) -> Result<CalendarHandle, ServiceError>;

    /// Events overlapping the half-open day window `[start, end)`.
    async fn list_day_events(&self, calendar_id: &str, start: NaiveDate, end: NaiveDate) -> Lookup;

    async fn create_all_day_series(
        &self,
        calendar_id: &str,
        title: &str,
        start: NaiveDate,
        rule: &RecurrenceRule,
        description: Option<&str>,
    ) -> Result<EventHandle, ServiceError>;

    async fn add_reminder(
        &self,
        calendar_id: &str,
        event: &EventHandle,
        reminder: Reminder,
    ) -> Result<(), ServiceError>;

    async fn insert_structural_event(
        &self,
        calendar_id: &str,
        payload: &StructuralEvent,
    ) -> Result<EventHandle, ServiceError>;

    /// One page of the calendar's own event list, optionally only events
    /// ending after `time_min`.
    async fn list_events_page(
        &self,
        calendar_id: &str,
        page_token: Option<&str>,
        time_min: Option<DateTime<Utc>>,
    ) -> Result<EventPage, ServiceError>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), ServiceError>;
}
