//! Google Calendar v3 adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use contact_dates_core::event::{
    BIRTHDAY_EVENT_TYPE, CalendarEvent, EventKind, Reminder, StructuralEvent, Transparency,
    Visibility,
};
use contact_dates_core::recurrence::RecurrenceRule;
use contact_dates_core::service::{CalendarHandle, EventHandle, EventPage};
use contact_dates_core::{CalendarService, Lookup, ServiceError};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;
use url::Url;

use crate::http::ApiClient;

const CALENDARS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars";

/// Maximum page size the events endpoint accepts.
const MAX_RESULTS: u32 = 2500;

pub struct GoogleCalendar {
    api: ApiClient,
    /// Time zone of each calendar seen so far
    zones: Mutex<HashMap<String, Tz>>,
}

impl GoogleCalendar {
    pub fn new(api: ApiClient) -> Self {
        GoogleCalendar {
            api,
            zones: Mutex::new(HashMap::new()),
        }
    }

    async fn fetch_meta(&self, calendar_id: &str) -> Result<CalendarMeta, ServiceError> {
        let meta: CalendarMeta = self.api.get(calendar_url(calendar_id, false, None)?).await?;
        self.zones
            .lock()
            .await
            .insert(calendar_id.to_string(), meta.zone());
        Ok(meta)
    }

    /// The calendar's own zone, fetched once per calendar.
    async fn zone(&self, calendar_id: &str) -> Result<Tz, ServiceError> {
        if let Some(tz) = self.zones.lock().await.get(calendar_id) {
            return Ok(*tz);
        }
        self.fetch_meta(calendar_id).await?;
        Ok(self.zones.lock().await.get(calendar_id).copied().unwrap_or(Tz::UTC))
    }
}

/// `calendars/{calendar_id}[/events[/{event_id}]]` with each id percent-encoded.
fn calendar_url(calendar_id: &str, events: bool, event_id: Option<&str>) -> Result<Url, ServiceError> {
    let mut url = Url::parse(CALENDARS_URL).map_err(|e| ServiceError::Rejected(e.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| ServiceError::Rejected("Invalid calendar URL".to_string()))?;
        segments.push(calendar_id);
        if events {
            segments.push("events");
        }
        if let Some(id) = event_id {
            segments.push(id);
        }
    }
    Ok(url)
}

/// Midnight of `day` in `tz` as RFC 3339, the bound all-day events are matched on.
///
/// When midnight falls in a DST gap the day starts an hour later.
fn zoned_midnight(day: NaiveDate, tz: Tz) -> String {
    let naive = day.and_time(NaiveTime::MIN);
    let start = tz
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest());
    match start {
        Some(dt) => dt.fixed_offset().to_rfc3339_opts(SecondsFormat::Secs, false),
        None => Utc.from_utc_datetime(&naive).to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

fn day_window_url(calendar_id: &str, start: NaiveDate, end: NaiveDate, tz: Tz) -> Result<Url, ServiceError> {
    let mut url = calendar_url(calendar_id, true, None)?;
    url.query_pairs_mut()
        .append_pair("timeMin", &zoned_midnight(start, tz))
        .append_pair("timeMax", &zoned_midnight(end, tz))
        .append_pair("timeZone", tz.name())
        .append_pair("singleEvents", "true")
        .append_pair("maxResults", &MAX_RESULTS.to_string());
    Ok(url)
}

fn event_list_url(
    calendar_id: &str,
    page_token: Option<&str>,
    time_min: Option<DateTime<Utc>>,
) -> Result<Url, ServiceError> {
    let mut url = calendar_url(calendar_id, true, None)?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("maxResults", &MAX_RESULTS.to_string());
        // Series masters only, one delete removes the whole series
        query.append_pair("singleEvents", "false");
        if let Some(token) = page_token {
            query.append_pair("pageToken", token);
        }
        if let Some(min) = time_min {
            query.append_pair("timeMin", &min.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
    }
    Ok(url)
}

#[async_trait]
impl CalendarService for GoogleCalendar {
    async fn get_calendar(&self, calendar_id: &str) -> Result<CalendarHandle, ServiceError> {
        let meta = self.fetch_meta(calendar_id).await?;
        Ok(CalendarHandle {
            id: meta.id,
            summary: meta.summary,
        })
    }

    async fn list_day_events(&self, calendar_id: &str, start: NaiveDate, end: NaiveDate) -> Lookup {
        let url = match self.zone(calendar_id).await {
            Ok(tz) => day_window_url(calendar_id, start, end, tz),
            Err(e) => Err(e),
        };
        let result = match url {
            Ok(url) => self.api.get::<EventList>(url).await,
            Err(e) => Err(e),
        };
        Lookup::from(result.map(|list| list.items.into_iter().map(CalendarEvent::from).collect()))
    }

    async fn create_all_day_series(
        &self,
        calendar_id: &str,
        title: &str,
        start: NaiveDate,
        rule: &RecurrenceRule,
        description: Option<&str>,
    ) -> Result<EventHandle, ServiceError> {
        let body = NewEvent::series(title, start, rule, description);
        let created: GoogleEvent = self
            .api
            .send_json(Method::POST, calendar_url(calendar_id, true, None)?, &body)
            .await?;
        Ok(EventHandle { id: created.id })
    }

    /// Reminders are stored as a list on the event, so read it, append, write back.
    async fn add_reminder(
        &self,
        calendar_id: &str,
        event: &EventHandle,
        reminder: Reminder,
    ) -> Result<(), ServiceError> {
        let url = calendar_url(calendar_id, true, Some(&event.id))?;
        let current: GoogleEvent = self.api.get(url.clone()).await?;

        let mut overrides = current
            .reminders
            .filter(|r| !r.use_default)
            .map(|r| r.overrides)
            .unwrap_or_default();
        overrides.push(reminder);

        let patch = ReminderPatch {
            reminders: Reminders {
                use_default: false,
                overrides,
            },
        };
        let _: GoogleEvent = self.api.send_json(Method::PATCH, url, &patch).await?;
        Ok(())
    }

    async fn insert_structural_event(
        &self,
        calendar_id: &str,
        payload: &StructuralEvent,
    ) -> Result<EventHandle, ServiceError> {
        let body = NewEvent::structural(payload);
        let created: GoogleEvent = self
            .api
            .send_json(Method::POST, calendar_url(calendar_id, true, None)?, &body)
            .await?;
        Ok(EventHandle { id: created.id })
    }

    async fn list_events_page(
        &self,
        calendar_id: &str,
        page_token: Option<&str>,
        time_min: Option<DateTime<Utc>>,
    ) -> Result<EventPage, ServiceError> {
        let list: EventList = self
            .api
            .get(event_list_url(calendar_id, page_token, time_min)?)
            .await?;
        Ok(list.into())
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), ServiceError> {
        self.api
            .delete(calendar_url(calendar_id, true, Some(event_id))?)
            .await
    }
}

// Wire types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarMeta {
    id: String,
    #[serde(default)]
    summary: String,
    time_zone: Option<String>,
}

impl CalendarMeta {
    fn zone(&self) -> Tz {
        match self.time_zone.as_deref().map(str::parse::<Tz>) {
            Some(Ok(tz)) => tz,
            Some(Err(_)) | None => {
                warn!(calendar = %self.id, zone = ?self.time_zone, "Unknown calendar time zone, using UTC");
                Tz::UTC
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventList {
    #[serde(default)]
    items: Vec<GoogleEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    id: String,
    #[serde(default)]
    summary: String,
    event_type: Option<String>,
    start: Option<EventStart>,
    reminders: Option<Reminders>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventStart {
    date: Option<NaiveDate>,
    date_time: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reminders {
    use_default: bool,
    #[serde(default)]
    overrides: Vec<Reminder>,
}

#[derive(Debug, Serialize)]
struct ReminderPatch {
    reminders: Reminders,
}

#[derive(Debug, Serialize)]
struct AllDay {
    date: String,
}

impl From<NaiveDate> for AllDay {
    fn from(date: NaiveDate) -> Self {
        AllDay {
            date: date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewEvent<'a> {
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    start: AllDay,
    end: AllDay,
    recurrence: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transparency: Option<Transparency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reminders: Option<Reminders>,
}

impl<'a> NewEvent<'a> {
    fn series(
        title: &'a str,
        start: NaiveDate,
        rule: &RecurrenceRule,
        description: Option<&'a str>,
    ) -> Self {
        let end = start.succ_opt().unwrap_or(start);
        NewEvent {
            summary: title,
            description: description.filter(|d| !d.is_empty()),
            start: start.into(),
            end: end.into(),
            recurrence: vec![rule.to_line()],
            event_type: None,
            transparency: None,
            visibility: None,
            reminders: None,
        }
    }

    fn structural(payload: &'a StructuralEvent) -> Self {
        NewEvent {
            summary: &payload.summary,
            description: None,
            start: payload.start.into(),
            end: payload.end.into(),
            recurrence: payload.recurrence.clone(),
            event_type: Some(BIRTHDAY_EVENT_TYPE),
            transparency: Some(payload.transparency),
            visibility: Some(payload.visibility),
            reminders: Some(Reminders {
                use_default: payload.reminders.uses_default(),
                overrides: payload.reminders.overrides().to_vec(),
            }),
        }
    }
}

impl From<GoogleEvent> for CalendarEvent {
    fn from(event: GoogleEvent) -> Self {
        let start = event
            .start
            .and_then(|s| s.date.or(s.date_time.map(|dt| dt.date_naive())));

        CalendarEvent {
            id: event.id,
            summary: event.summary,
            kind: EventKind::from_type_marker(event.event_type.as_deref().unwrap_or("default")),
            start,
        }
    }
}

impl From<EventList> for EventPage {
    fn from(list: EventList) -> Self {
        EventPage {
            events: list.items.into_iter().map(CalendarEvent::from).collect(),
            next_page_token: list.next_page_token,
        }
    }
}
