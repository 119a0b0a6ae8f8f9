//! Lazy, restartable page sequences over the two services.
//!
//! A pager owns its continuation token. A failed fetch leaves the token
//! untouched, so the caller can simply call `next_page` again (or rebuild a
//! pager from `resume_token`) to retry the same page.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::contact::ContactRecord;
use crate::event::CalendarEvent;
use crate::service::{CalendarService, DirectoryService, ServiceError};

/// Page through the directory's connections.
pub struct ContactPager<'a, D: DirectoryService + ?Sized> {
    directory: &'a D,
    page_size: u32,
    token: Option<String>,
    done: bool,
    pages_fetched: usize,
}

impl<'a, D: DirectoryService + ?Sized> ContactPager<'a, D> {
    pub fn new(directory: &'a D, page_size: u32) -> Self {
        Self::resume(directory, page_size, None)
    }

    /// Continue a sequence from a token returned by `resume_token`.
    pub fn resume(directory: &'a D, page_size: u32, token: Option<String>) -> Self {
        ContactPager {
            directory,
            page_size,
            token,
            done: false,
            pages_fetched: 0,
        }
    }

    /// Fetch the next page; `Ok(None)` once the sequence is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<ContactRecord>>, ServiceError> {
        if self.done {
            return Ok(None);
        }

        let page = self
            .directory
            .list_connections(self.page_size, self.token.as_deref())
            .await?;

        self.pages_fetched += 1;
        self.advance(page.next_page_token);
        debug!(
            page = self.pages_fetched,
            contacts = page.contacts.len(),
            "Fetched directory page"
        );

        Ok(Some(page.contacts))
    }

    pub fn resume_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    fn advance(&mut self, next: Option<String>) {
        self.token = next.filter(|t| !t.is_empty());
        self.done = self.token.is_none();
    }
}

/// Page through a calendar's own event list.
pub struct EventPager<'a, C: CalendarService + ?Sized> {
    calendar: &'a C,
    calendar_id: &'a str,
    time_min: Option<DateTime<Utc>>,
    token: Option<String>,
    done: bool,
}

impl<'a, C: CalendarService + ?Sized> EventPager<'a, C> {
    pub fn new(calendar: &'a C, calendar_id: &'a str, time_min: Option<DateTime<Utc>>) -> Self {
        EventPager {
            calendar,
            calendar_id,
            time_min,
            token: None,
            done: false,
        }
    }

    pub async fn next_page(&mut self) -> Result<Option<Vec<CalendarEvent>>, ServiceError> {
        if self.done {
            return Ok(None);
        }

        let page = self
            .calendar
            .list_events_page(self.calendar_id, self.token.as_deref(), self.time_min)
            .await?;

        self.token = page.next_page_token.filter(|t| !t.is_empty());
        self.done = self.token.is_none();

        Ok(Some(page.events))
    }

    pub fn resume_token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}
