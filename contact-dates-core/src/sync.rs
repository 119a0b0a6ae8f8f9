//! Reconciliation: directory date facts -> recurring calendar events.
//!
//! One run pages through the directory, gates each contact by label and each
//! date fact by the month/day filter, then asks the existence oracle before
//! handing misses to the event writer. A missing target calendar aborts the
//! whole run; per-event failures are only counted.

use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::RunConfig;
use crate::contact::{ContactDate, ContactRecord, FactKind};
use crate::error::{SyncError, SyncResult};
use crate::event::{EventKind, TargetEvent};
use crate::filter::passes_label_gate;
use crate::oracle::event_exists;
use crate::pager::ContactPager;
use crate::service::{CalendarService, DirectoryService, ServiceError};
use crate::writer::{EventWriter, WriteOutcome};

/// Per-run counters. `processed` counts admitted date facts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub processed: usize,
    pub created: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl SyncStats {
    fn record(&mut self, outcome: FactOutcome) {
        self.processed += 1;
        match outcome {
            FactOutcome::Created => self.created += 1,
            FactOutcome::Skipped => self.skipped += 1,
            FactOutcome::Error => self.errors += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FactOutcome {
    Created,
    Skipped,
    Error,
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    /// Every directory page was consumed
    Completed,
    /// Stopped early; no further pages were fetched
    Aborted(SyncError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub stats: SyncStats,
    pub state: RunState,
    pub pages_fetched: usize,
}

impl SyncReport {
    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }
}

/// Reconcile the directory against the configured target calendar.
///
/// Always returns the stats accumulated so far, even when aborted.
pub async fn run_sync<D, C>(config: &RunConfig, directory: &D, calendar: &C) -> SyncReport
where
    D: DirectoryService + ?Sized,
    C: CalendarService + ?Sized,
{
    run_sync_on(config, directory, calendar, Local::now().date_naive()).await
}

/// [`run_sync`] with an explicit "today", which decides the year of
/// date facts that carry none.
pub async fn run_sync_on<D, C>(
    config: &RunConfig,
    directory: &D,
    calendar: &C,
    today: NaiveDate,
) -> SyncReport
where
    D: DirectoryService + ?Sized,
    C: CalendarService + ?Sized,
{
    if config.dry_run {
        info!("DRY RUN MODE: No events will be created, only logged");
    }

    let calendar_id = config.target.calendar_id();
    let mut pager = ContactPager::new(directory, config.page_size);

    match calendar.get_calendar(calendar_id).await {
        Ok(handle) => {
            debug!(calendar = %handle.id, summary = %handle.summary, "Target calendar resolved");
        }
        Err(ServiceError::NotFound(_)) => {
            let reason = SyncError::TargetNotFound(calendar_id.to_string());
            return finish(SyncStats::default(), RunState::Aborted(reason), 0);
        }
        // A missing calendar will still surface on the first lookup
        Err(e) => warn!("Could not verify calendar {}: {}", calendar_id, e),
    }

    let mut reconciler = Reconciler {
        config,
        calendar,
        writer: EventWriter::new(calendar, &config.target, config.dry_run),
        current_year: today.year(),
        stats: SyncStats::default(),
    };
    let state = reconciler.run(&mut pager).await;

    finish(reconciler.stats, state, pager.pages_fetched())
}

fn finish(stats: SyncStats, state: RunState, pages_fetched: usize) -> SyncReport {
    if let RunState::Aborted(reason) = &state {
        error!("Error: {}", reason);
    }

    info!(
        "Summary: Processed {} contacts, created {} events, skipped {} existing events, encountered {} errors",
        stats.processed, stats.created, stats.skipped, stats.errors
    );

    SyncReport {
        stats,
        state,
        pages_fetched,
    }
}

struct Reconciler<'a, C: CalendarService + ?Sized> {
    config: &'a RunConfig,
    calendar: &'a C,
    writer: EventWriter<'a, C>,
    current_year: i32,
    stats: SyncStats,
}

impl<'a, C: CalendarService + ?Sized> Reconciler<'a, C> {
    async fn run<D: DirectoryService + ?Sized>(&mut self, pager: &mut ContactPager<'_, D>) -> RunState {
        loop {
            let contacts = match pager.next_page().await {
                Ok(Some(contacts)) => contacts,
                Ok(None) => return RunState::Completed,
                Err(e) => return RunState::Aborted(SyncError::DirectoryUnavailable(e)),
            };

            for contact in &contacts {
                if let Err(e) = self.reconcile_contact(contact).await {
                    return RunState::Aborted(e);
                }
            }
        }
    }

    async fn reconcile_contact(&mut self, contact: &ContactRecord) -> SyncResult<()> {
        if !passes_label_gate(&contact.memberships, self.config.required_label.as_deref()) {
            return Ok(());
        }

        for fact in contact.birthdays() {
            self.reconcile_fact(contact.name(), fact).await?;
        }

        if !self.config.only_birthdays {
            for fact in contact.custom_events() {
                self.reconcile_fact(contact.name(), fact).await?;
            }
        }

        Ok(())
    }

    /// Returns `Err` only for run-ending conditions.
    async fn reconcile_fact(&mut self, name: &str, fact: &ContactDate) -> SyncResult<()> {
        if !self.config.date_filter.admit(fact.date.as_ref()) {
            return Ok(());
        }

        let Some(start) = fact.date.and_then(|d| d.resolve(self.current_year)) else {
            debug!(contact = name, "Skipping date that does not exist in the calendar");
            return Ok(());
        };

        let templates = &self.config.templates;
        let (title, description) = match fact.kind {
            FactKind::Birthday => (templates.birthday_title(name), templates.birthday_description(name)),
            FactKind::Custom => {
                let label = fact.label.as_deref();
                (
                    templates.special_event_title(name, label),
                    templates.special_event_description(name, label),
                )
            }
        };

        let calendar_id = self.config.target.calendar_id();
        let outcome = match event_exists(self.calendar, calendar_id, start, &title).await {
            Ok(true) => {
                info!(
                    "{} already exists for {} on {}",
                    title,
                    name,
                    start.format("%a %b %d %Y")
                );
                FactOutcome::Skipped
            }
            Ok(false) => {
                let kind = if self.config.target.is_structural() {
                    EventKind::Birthday
                } else {
                    EventKind::Default
                };
                let event = TargetEvent::annual(
                    title,
                    start,
                    self.config.reminders.clone(),
                    description,
                    kind,
                );

                match self.writer.write(&event, name).await? {
                    WriteOutcome::Created | WriteOutcome::WouldCreate => FactOutcome::Created,
                    WriteOutcome::Failed(_) => FactOutcome::Error,
                }
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Error checking existing events for {}: {}", name, e);
                FactOutcome::Error
            }
        };

        self.stats.record(outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Target, allow_set};
    use crate::event::{Reminder, ReminderMethod, ReminderSetting};
    use crate::format::DEFAULT_BIRTHDAY_DESCRIPTION;
    use crate::memory::{MemoryCalendar, MemoryDirectory, StoredEvent, contact, with_custom, with_label};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn config() -> RunConfig {
        RunConfig::new(Target::Calendar("cal".into()))
    }

    fn stats(processed: usize, created: usize, skipped: usize, errors: usize) -> SyncStats {
        SyncStats {
            processed,
            created,
            skipped,
            errors,
        }
    }

    #[tokio::test]
    async fn test_first_run_creates_birthday() {
        let directory = MemoryDirectory::new(vec![vec![contact("Ada", &[(3, 14)])]]);
        let calendar = MemoryCalendar::new("cal");

        let report = run_sync_on(&config(), &directory, &calendar, today()).await;

        assert_eq!(report.stats, stats(1, 1, 0, 0));
        assert!(report.is_completed());
        let events = calendar.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "Ada's Birthday");
        assert_eq!(events[0].start, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(events[0].recurrence, vec!["RRULE:FREQ=YEARLY".to_string()]);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let directory = MemoryDirectory::new(vec![vec![contact("Ada", &[(3, 14)])]]);
        let calendar = MemoryCalendar::new("cal");

        let first = run_sync_on(&config(), &directory, &calendar, today()).await;
        let second = run_sync_on(&config(), &directory, &calendar, today()).await;

        assert_eq!(first.stats, stats(1, 1, 0, 0));
        assert_eq!(second.stats, stats(1, 0, 1, 0));
        assert_eq!(calendar.events().len(), 1);
    }

    #[tokio::test]
    async fn test_rerun_next_year_still_matches() {
        let directory = MemoryDirectory::new(vec![vec![contact("Ada", &[(3, 14)])]]);
        let calendar = MemoryCalendar::new("cal");

        run_sync_on(&config(), &directory, &calendar, today()).await;
        let next_year = NaiveDate::from_ymd_opt(2027, 1, 2).unwrap();
        let report = run_sync_on(&config(), &directory, &calendar, next_year).await;

        assert_eq!(report.stats, stats(1, 0, 1, 0));
    }

    #[tokio::test]
    async fn test_duplicate_titles_within_one_run_create_once() {
        let directory = MemoryDirectory::new(vec![
            vec![contact("Ada", &[(3, 14)])],
            vec![contact("Ada", &[(3, 14)])],
        ]);
        let calendar = MemoryCalendar::new("cal");

        let report = run_sync_on(&config(), &directory, &calendar, today()).await;

        assert_eq!(report.stats, stats(2, 1, 1, 0));
    }

    #[tokio::test]
    async fn test_missing_target_aborts_without_further_pages() {
        let directory = MemoryDirectory::new(vec![
            vec![contact("Ada", &[(3, 14)]), contact("Grace", &[(12, 9)])],
            vec![contact("Linus", &[(12, 28)])],
        ]);
        let calendar = MemoryCalendar::new("cal").missing_on_lookup();

        let report = run_sync_on(&config(), &directory, &calendar, today()).await;

        assert_eq!(report.stats.created, 0);
        assert_eq!(report.state, RunState::Aborted(SyncError::TargetNotFound("cal".into())));
        assert_eq!(calendar.lookups(), 1);
        assert_eq!(directory.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_calendar_aborts_before_paging() {
        let directory = MemoryDirectory::new(vec![vec![contact("Ada", &[(3, 14)])]]);
        let calendar = MemoryCalendar::new("cal").missing();

        let report = run_sync_on(&config(), &directory, &calendar, today()).await;

        assert_eq!(report.stats, SyncStats::default());
        assert!(matches!(report.state, RunState::Aborted(SyncError::TargetNotFound(_))));
        assert_eq!(directory.calls(), 0);
    }

    #[tokio::test]
    async fn test_directory_failure_keeps_partial_stats() {
        let directory = MemoryDirectory::new(vec![
            vec![contact("Ada", &[(3, 14)])],
            vec![contact("Grace", &[(12, 9)])],
        ])
        .failing_at(1);
        let calendar = MemoryCalendar::new("cal");

        let report = run_sync_on(&config(), &directory, &calendar, today()).await;

        assert_eq!(report.stats, stats(1, 1, 0, 0));
        assert!(matches!(
            report.state,
            RunState::Aborted(SyncError::DirectoryUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_write_errors_are_counted_and_run_continues() {
        let directory = MemoryDirectory::new(vec![vec![
            contact("Ada", &[(3, 14)]),
            contact("Grace", &[(12, 9)]),
        ]]);
        let calendar = MemoryCalendar::new("cal").failing_writes();

        let report = run_sync_on(&config(), &directory, &calendar, today()).await;

        assert_eq!(report.stats, stats(2, 0, 0, 2));
        assert!(report.is_completed());
    }

    #[tokio::test]
    async fn test_date_filter_and_missing_dates() {
        let mut ada = contact("Ada", &[(6, 1)]);
        ada.dates.push(crate::contact::ContactDate {
            kind: FactKind::Birthday,
            date: None,
            label: None,
        });
        let directory = MemoryDirectory::new(vec![vec![ada, contact("Grace", &[(12, 9)])]]);
        let calendar = MemoryCalendar::new("cal");

        let mut config = config();
        config.date_filter.months = allow_set(&[12]);
        let report = run_sync_on(&config, &directory, &calendar, today()).await;

        assert_eq!(report.stats, stats(1, 1, 0, 0));
        assert_eq!(calendar.events()[0].summary, "Grace's Birthday");
    }

    #[tokio::test]
    async fn test_custom_events_and_only_birthdays() {
        let ada = with_custom(contact("Ada", &[(3, 14)]), Some("Anniversary"), 6, 1);
        let ada = with_custom(ada, None, 7, 4);
        let directory = MemoryDirectory::new(vec![vec![ada]]);

        let calendar = MemoryCalendar::new("cal");
        let report = run_sync_on(&config(), &directory, &calendar, today()).await;
        assert_eq!(report.stats, stats(3, 3, 0, 0));
        let titles: Vec<String> = calendar.events().into_iter().map(|e| e.summary).collect();
        assert_eq!(titles, vec!["Ada's Birthday", "Ada's Anniversary", "Ada's Special Event"]);

        let calendar = MemoryCalendar::new("cal");
        let mut only_birthdays = config();
        only_birthdays.only_birthdays = true;
        let report = run_sync_on(&only_birthdays, &directory, &calendar, today()).await;
        assert_eq!(report.stats, stats(1, 1, 0, 0));
    }

    #[tokio::test]
    async fn test_label_restriction() {
        let directory = MemoryDirectory::new(vec![vec![
            with_label(contact("Ada", &[(3, 14)]), "contactGroups/family"),
            with_custom(contact("Grace", &[(12, 9)]), Some("Anniversary"), 6, 1),
        ]]);
        let calendar = MemoryCalendar::new("cal");

        let mut config = config();
        config.required_label = Some("family".into());
        let report = run_sync_on(&config, &directory, &calendar, today()).await;

        assert_eq!(report.stats, stats(1, 1, 0, 0));
        assert_eq!(calendar.events()[0].summary, "Ada's Birthday");
    }

    #[tokio::test]
    async fn test_dry_run_counts_without_writing() {
        let directory = MemoryDirectory::new(vec![vec![contact("Ada", &[(3, 14)])]]);
        let calendar = MemoryCalendar::new("cal");

        let report = run_sync_on(&config().with_dry_run(true), &directory, &calendar, today()).await;

        assert_eq!(report.stats, stats(1, 1, 0, 0));
        assert!(calendar.events().is_empty());
    }

    #[tokio::test]
    async fn test_structural_target_writes_birthday_events() {
        let directory = MemoryDirectory::new(vec![vec![contact("Ada", &[(2, 29)])]]);
        let calendar = MemoryCalendar::new("primary");

        let mut config = RunConfig::new(Target::Structural);
        config.reminders = ReminderSetting::Overrides(vec![Reminder {
            method: ReminderMethod::Popup,
            minutes: 720,
        }]);
        config.templates.birthday_description = Some(DEFAULT_BIRTHDAY_DESCRIPTION.to_string());
        let report = run_sync_on(&config, &directory, &calendar, today()).await;

        assert_eq!(report.stats, stats(1, 1, 0, 0));
        let event = &calendar.events()[0];
        assert_eq!(event.kind, EventKind::Birthday);
        assert_eq!(event.start, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(
            event.recurrence,
            vec!["RRULE:FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=-1".to_string()]
        );
        assert_eq!(event.description, None);
    }

    #[tokio::test]
    async fn test_existing_event_with_other_title_does_not_block() {
        let directory = MemoryDirectory::new(vec![vec![contact("Ada", &[(3, 14)])]]);
        let calendar = MemoryCalendar::new("cal").with_event(StoredEvent::new(
            "pi",
            "Pi Day",
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            EventKind::Default,
        ));

        let report = run_sync_on(&config(), &directory, &calendar, today()).await;

        assert_eq!(report.stats, stats(1, 1, 0, 0));
    }
}
