//! Deletion sweep: removes events this engine created.
//!
//! Events are recognised either by the structural birthday marker or, on a
//! regular calendar, by their title containing one of the active patterns.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::config::RunConfig;
use crate::event::{CalendarEvent, EventKind};
use crate::format::BIRTHDAY_LABEL;
use crate::labels::collect_labels;
use crate::pager::EventPager;
use crate::service::{CalendarService, DirectoryService, ServiceError};

/// What makes an event deletable during one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionPatterns {
    /// Structural targets match on the event type marker only
    pub structural: bool,
    pub patterns: BTreeSet<String>,
}

impl DeletionPatterns {
    /// Title matching is a heuristic: any event whose title contains a
    /// pattern is taken, including ones a person typed in by hand. Blank
    /// patterns match nothing.
    pub fn is_deletable(&self, event: &CalendarEvent) -> bool {
        if event.kind == EventKind::Birthday {
            return true;
        }
        if self.structural {
            return false;
        }
        self.patterns
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .any(|p| event.summary.contains(p))
    }
}

/// Assemble the active patterns for `config`.
///
/// Labels are only collected from the directory for regular calendars when
/// custom events are in play.
pub async fn build_patterns<D: DirectoryService + ?Sized>(
    config: &RunConfig,
    directory: &D,
) -> DeletionPatterns {
    if config.target.is_structural() {
        return DeletionPatterns {
            structural: true,
            patterns: BTreeSet::new(),
        };
    }

    let mut patterns = BTreeSet::from([BIRTHDAY_LABEL.to_string()]);

    if let Some(pattern) = config.delete_pattern.as_deref().map(str::trim) {
        if !pattern.is_empty() {
            patterns.insert(pattern.to_string());
        }
    }

    if !config.only_birthdays {
        let labels = collect_labels(directory, config.page_size, &config.templates.no_label_title).await;
        patterns.extend(labels);
    }

    debug!(?patterns, "Deletion patterns");
    DeletionPatterns {
        structural: false,
        patterns,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed { deleted: usize },
    TargetNotFound,
}

impl SweepOutcome {
    /// Deleted count, or `-1` when the target calendar does not exist.
    pub fn count(&self) -> i64 {
        match self {
            SweepOutcome::Completed { deleted } => *deleted as i64,
            SweepOutcome::TargetNotFound => -1,
        }
    }
}

/// Delete every event in the target calendar that the active patterns match.
///
/// In dry run the matches are logged and counted but nothing is deleted.
pub async fn run_deletion_sweep<D, C>(config: &RunConfig, directory: &D, calendar: &C) -> SweepOutcome
where
    D: DirectoryService + ?Sized,
    C: CalendarService + ?Sized,
{
    let calendar_id = config.target.calendar_id();

    match calendar.get_calendar(calendar_id).await {
        Ok(handle) => debug!(calendar = %handle.id, "Sweeping calendar"),
        Err(ServiceError::NotFound(_)) => {
            error!("Calendar not found: {}", calendar_id);
            return SweepOutcome::TargetNotFound;
        }
        Err(e) => warn!("Could not verify calendar {}: {}", calendar_id, e),
    }

    let patterns = build_patterns(config, directory).await;
    let time_min = config.delete_only_future.then(Utc::now);
    let mut pager = EventPager::new(calendar, calendar_id, time_min);
    let mut deleted = 0;
    let mut first_page = true;

    loop {
        let events = match pager.next_page().await {
            Ok(Some(events)) => events,
            Ok(None) => break,
            Err(ServiceError::NotFound(_)) if first_page => {
                error!("Calendar not found: {}", calendar_id);
                return SweepOutcome::TargetNotFound;
            }
            Err(e) => {
                error!("Error listing events: {}", e);
                break;
            }
        };
        first_page = false;

        for event in events.iter().filter(|e| patterns.is_deletable(e)) {
            if config.dry_run {
                info!("DRY RUN: Would delete event: {}", event.summary);
                deleted += 1;
                continue;
            }

            match calendar.delete_event(calendar_id, &event.id).await {
                Ok(()) => {
                    info!("Deleted event: {}", event.summary);
                    deleted += 1;
                }
                Err(e) => warn!("Error deleting event {}: {}", event.summary, e),
            }
        }
    }

    if config.dry_run {
        info!("DRY RUN: Would delete {} events", deleted);
    } else {
        info!("Deleted {} events", deleted);
    }

    SweepOutcome::Completed { deleted }
}
