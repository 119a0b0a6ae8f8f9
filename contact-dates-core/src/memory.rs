//! In-memory directory and calendar used by the engine tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::contact::{ContactDate, ContactRecord, DateFact, FactKind, LabelMembership};
use crate::event::{CalendarEvent, EventKind, Reminder, StructuralEvent};
use crate::recurrence::RecurrenceRule;
use crate::service::{
    CalendarHandle, CalendarService, ContactPage, DirectoryService, EventHandle, EventPage, Lookup,
    ServiceError,
};

/// A contact with yearless birthdays on the given (month, day) pairs.
pub fn contact(name: &str, birthdays: &[(u32, u32)]) -> ContactRecord {
    ContactRecord {
        resource_name: format!("people/{}", name.to_lowercase()),
        display_name: Some(name.to_string()),
        memberships: vec![],
        dates: birthdays
            .iter()
            .map(|&(month, day)| ContactDate {
                kind: FactKind::Birthday,
                date: Some(DateFact::new(month, day, None)),
                label: None,
            })
            .collect(),
    }
}

pub fn with_custom(mut record: ContactRecord, label: Option<&str>, month: u32, day: u32) -> ContactRecord {
    record.dates.push(ContactDate {
        kind: FactKind::Custom,
        date: Some(DateFact::new(month, day, None)),
        label: label.map(str::to_string),
    });
    record
}

pub fn with_label(mut record: ContactRecord, group_id: &str) -> ContactRecord {
    record.memberships.push(LabelMembership {
        group_id: group_id.to_string(),
    });
    record
}

pub struct MemoryDirectory {
    pages: Vec<Vec<ContactRecord>>,
    fail_at: Mutex<Option<(usize, bool)>>,
    calls: Mutex<usize>,
}

impl MemoryDirectory {
    pub fn new(pages: Vec<Vec<ContactRecord>>) -> Self {
        MemoryDirectory {
            pages,
            fail_at: Mutex::new(None),
            calls: Mutex::new(0),
        }
    }

    /// Fail every request for page `index`.
    pub fn failing_at(self, index: usize) -> Self {
        *self.fail_at.lock().unwrap() = Some((index, false));
        self
    }

    /// Fail the first request for page `index` only.
    pub fn failing_once_at(self, index: usize) -> Self {
        *self.fail_at.lock().unwrap() = Some((index, true));
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl DirectoryService for MemoryDirectory {
    async fn list_connections(
        &self,
        _page_size: u32,
        page_token: Option<&str>,
    ) -> Result<ContactPage, ServiceError> {
        *self.calls.lock().unwrap() += 1;

        let index = page_token
            .and_then(|t| t.strip_prefix("page-"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);

        let mut fail_at = self.fail_at.lock().unwrap();
        if let Some((at, once)) = *fail_at {
            if at == index {
                if once {
                    *fail_at = None;
                }
                return Err(ServiceError::Unavailable("directory offline".into()));
            }
        }

        let contacts = self.pages.get(index).cloned().unwrap_or_default();
        let next_page_token = (index + 1 < self.pages.len()).then(|| format!("page-{}", index + 1));

        Ok(ContactPage {
            contacts,
            next_page_token,
        })
    }
}

/// An event held by [`MemoryCalendar`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    pub id: String,
    pub summary: String,
    pub start: NaiveDate,
    pub kind: EventKind,
    pub recurrence: Vec<String>,
    pub description: Option<String>,
    pub reminders: Vec<Reminder>,
}

impl StoredEvent {
    pub fn new(id: &str, summary: &str, start: NaiveDate, kind: EventKind) -> Self {
        StoredEvent {
            id: id.to_string(),
            summary: summary.to_string(),
            start,
            kind,
            recurrence: vec!["RRULE:FREQ=YEARLY".to_string()],
            description: None,
            reminders: vec![],
        }
    }

    /// Yearly series occur on the same month/day every year.
    fn occurs_on(&self, day: NaiveDate) -> bool {
        if self.recurrence.is_empty() {
            return self.start == day;
        }
        self.start <= day && self.start.month() == day.month() && self.start.day() == day.day()
    }

    fn view(&self) -> CalendarEvent {
        CalendarEvent {
            id: self.id.clone(),
            summary: self.summary.clone(),
            kind: self.kind.clone(),
            start: Some(self.start),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Availability {
    Present,
    /// Every call reports the calendar as missing
    Missing,
    /// The calendar resolves but day lookups report it missing
    LookupMissing,
}

pub struct MemoryCalendar {
    id: String,
    availability: Availability,
    fail_writes: bool,
    fail_listing_at: Option<(usize, ServiceError)>,
    page_size: usize,
    events: Mutex<Vec<StoredEvent>>,
    next_id: Mutex<usize>,
    lookups: Mutex<usize>,
    deletes: Mutex<Vec<String>>,
    structural_inserts: Mutex<usize>,
    series_creates: Mutex<usize>,
}

impl MemoryCalendar {
    pub fn new(id: &str) -> Self {
        MemoryCalendar {
            id: id.to_string(),
            availability: Availability::Present,
            fail_writes: false,
            fail_listing_at: None,
            page_size: 250,
            events: Mutex::new(vec![]),
            next_id: Mutex::new(0),
            lookups: Mutex::new(0),
            deletes: Mutex::new(vec![]),
            structural_inserts: Mutex::new(0),
            series_creates: Mutex::new(0),
        }
    }

    pub fn missing(mut self) -> Self {
        self.availability = Availability::Missing;
        self
    }

    pub fn missing_on_lookup(mut self) -> Self {
        self.availability = Availability::LookupMissing;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Fail every listing request for event page `index` with `error`.
    pub fn failing_listing_at(mut self, index: usize, error: ServiceError) -> Self {
        self.fail_listing_at = Some((index, error));
        self
    }

    pub fn paged_by(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_event(self, event: StoredEvent) -> Self {
        self.events.lock().unwrap().push(event);
        self
    }

    /// Events that have not been deleted.
    pub fn events(&self) -> Vec<StoredEvent> {
        let deleted = self.deleted();
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| !deleted.contains(&e.id))
            .cloned()
            .collect()
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn structural_inserts(&self) -> usize {
        *self.structural_inserts.lock().unwrap()
    }

    pub fn series_creates(&self) -> usize {
        *self.series_creates.lock().unwrap()
    }

    fn check(&self, calendar_id: &str) -> Result<(), ServiceError> {
        if calendar_id != self.id || self.availability == Availability::Missing {
            return Err(ServiceError::NotFound(calendar_id.to_string()));
        }
        Ok(())
    }

    fn store(&self, mut event: StoredEvent) -> EventHandle {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        event.id = format!("evt-{}", *next_id);
        let handle = EventHandle {
            id: event.id.clone(),
        };
        self.events.lock().unwrap().push(event);
        handle
    }
}

#[async_trait]
impl CalendarService for MemoryCalendar {
    async fn get_calendar(&self, calendar_id: &str) -> Result<CalendarHandle, ServiceError> {
        self.check(calendar_id)?;
        Ok(CalendarHandle {
            id: self.id.clone(),
            summary: "Birthdays".to_string(),
        })
    }

    async fn list_day_events(&self, calendar_id: &str, start: NaiveDate, _end: NaiveDate) -> Lookup {
        *self.lookups.lock().unwrap() += 1;

        if self.availability == Availability::LookupMissing {
            return Lookup::NotFound;
        }

        let result = self.check(calendar_id).map(|_| {
            self.events()
                .iter()
                .filter(|e| e.occurs_on(start))
                .map(StoredEvent::view)
                .collect::<Vec<_>>()
        });

        Lookup::from(result)
    }

    async fn create_all_day_series(
        &self,
        calendar_id: &str,
        title: &str,
        start: NaiveDate,
        rule: &RecurrenceRule,
        description: Option<&str>,
    ) -> Result<EventHandle, ServiceError> {
        self.check(calendar_id)?;
        if self.fail_writes {
            return Err(ServiceError::Rejected("quota exceeded".into()));
        }
        *self.series_creates.lock().unwrap() += 1;

        let mut event = StoredEvent::new("", title, start, EventKind::Default);
        event.recurrence = vec![rule.to_line()];
        event.description = description.map(str::to_string);
        Ok(self.store(event))
    }

    async fn add_reminder(
        &self,
        calendar_id: &str,
        event: &EventHandle,
        reminder: Reminder,
    ) -> Result<(), ServiceError> {
        self.check(calendar_id)?;
        let mut events = self.events.lock().unwrap();
        let stored = events
            .iter_mut()
            .find(|e| e.id == event.id)
            .ok_or_else(|| ServiceError::NotFound(event.id.clone()))?;
        stored.reminders.push(reminder);
        Ok(())
    }

    async fn insert_structural_event(
        &self,
        calendar_id: &str,
        payload: &StructuralEvent,
    ) -> Result<EventHandle, ServiceError> {
        self.check(calendar_id)?;
        if self.fail_writes {
            return Err(ServiceError::Rejected("quota exceeded".into()));
        }
        *self.structural_inserts.lock().unwrap() += 1;

        let mut event = StoredEvent::new("", &payload.summary, payload.start, payload.kind.clone());
        event.recurrence = payload.recurrence.clone();
        event.reminders = payload.reminders.overrides().to_vec();
        Ok(self.store(event))
    }

    async fn list_events_page(
        &self,
        calendar_id: &str,
        page_token: Option<&str>,
        time_min: Option<DateTime<Utc>>,
    ) -> Result<EventPage, ServiceError> {
        self.check(calendar_id)?;

        let offset = page_token.and_then(|t| t.parse::<usize>().ok()).unwrap_or(0);

        if let Some((index, error)) = &self.fail_listing_at {
            if offset / self.page_size == *index {
                return Err(error.clone());
            }
        }

        let min_day = time_min.map(|t| t.date_naive());

        let visible: Vec<CalendarEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| match min_day {
                Some(day) => !e.recurrence.is_empty() || e.start >= day,
                None => true,
            })
            .map(StoredEvent::view)
            .collect();

        let events: Vec<CalendarEvent> = visible.iter().skip(offset).take(self.page_size).cloned().collect();
        let next = offset + self.page_size;
        let next_page_token = (next < visible.len()).then(|| next.to_string());

        Ok(EventPage {
            events,
            next_page_token,
        })
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), ServiceError> {
        self.check(calendar_id)?;
        if self.fail_writes {
            return Err(ServiceError::Rejected("quota exceeded".into()));
        }
        // Listing pages stay a snapshot, so only record the deletion.
        self.deletes.lock().unwrap().push(event_id.to_string());
        Ok(())
    }
}
