//! Creates the recurring event for one date fact.

use tracing::{debug, info, warn};

use crate::config::Target;
use crate::error::{SyncError, SyncResult};
use crate::event::{StructuralEvent, TargetEvent};
use crate::service::{CalendarService, ServiceError};

/// What happened to a single create.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Created,
    /// Dry run: the create was decided but not issued
    WouldCreate,
    /// The create (or a reminder on it) failed; the run continues
    Failed(SyncError),
}

pub struct EventWriter<'a, C: CalendarService + ?Sized> {
    calendar: &'a C,
    target: &'a Target,
    dry_run: bool,
}

impl<'a, C: CalendarService + ?Sized> EventWriter<'a, C> {
    pub fn new(calendar: &'a C, target: &'a Target, dry_run: bool) -> Self {
        EventWriter {
            calendar,
            target,
            dry_run,
        }
    }

    /// Write `event`. Only `TargetNotFound` is returned as an error; every
    /// other failure is reported as [`WriteOutcome::Failed`].
    pub async fn write(&self, event: &TargetEvent, contact_name: &str) -> SyncResult<WriteOutcome> {
        if self.dry_run {
            info!(
                "DRY RUN: Would create {} for {} on {}",
                event.title,
                contact_name,
                event.start.format("%a %b %d %Y")
            );
            return Ok(WriteOutcome::WouldCreate);
        }

        let result = if self.target.is_structural() {
            self.write_structural(event).await
        } else {
            self.write_series(event).await
        };

        match result {
            Ok(()) => {
                info!(
                    "{} created for {} on {}",
                    event.title,
                    contact_name,
                    event.start.format("%a %b %d %Y")
                );
                Ok(WriteOutcome::Created)
            }
            Err(ServiceError::NotFound(_)) => Err(SyncError::TargetNotFound(
                self.target.calendar_id().to_string(),
            )),
            Err(e) => {
                warn!("Error creating event for {}: {}", contact_name, e);
                Ok(WriteOutcome::Failed(SyncError::Write(e.to_string())))
            }
        }
    }

    async fn write_series(&self, event: &TargetEvent) -> Result<(), ServiceError> {
        let calendar_id = self.target.calendar_id();

        let handle = self
            .calendar
            .create_all_day_series(
                calendar_id,
                &event.title,
                event.start,
                &event.recurrence,
                event.description.as_deref(),
            )
            .await?;

        for reminder in event.reminders.overrides() {
            self.calendar
                .add_reminder(calendar_id, &handle, *reminder)
                .await
                .map_err(|e| match e {
                    // The series exists, so a missing event here is not a missing calendar
                    ServiceError::NotFound(msg) => ServiceError::Rejected(msg),
                    other => other,
                })?;
        }

        Ok(())
    }

    async fn write_structural(&self, event: &TargetEvent) -> Result<(), ServiceError> {
        if event.description.is_some() {
            debug!(title = %event.title, "Dropping description for birthday-typed event");
        }

        let payload = StructuralEvent::birthday(event);
        self.calendar
            .insert_structural_event(self.target.calendar_id(), &payload)
            .await?;

        Ok(())
    }
}
