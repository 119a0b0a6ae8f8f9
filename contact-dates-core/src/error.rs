//! Error types for contact-dates.

use thiserror::Error;

use crate::service::ServiceError;

/// Errors raised while reconciling a single run.
///
/// `DirectoryUnavailable` and `TargetNotFound` end the run; the other two are
/// per-event and only counted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(ServiceError),

    #[error("Calendar not found or invalid ID: {0}")]
    TargetNotFound(String),

    #[error("Failed to look up existing events: {0}")]
    Lookup(String),

    #[error("Failed to write event: {0}")]
    Write(String),
}

impl SyncError {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::DirectoryUnavailable(_) | SyncError::TargetNotFound(_)
        )
    }
}

/// Invalid run configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Month filter contains {0}, expected 1-12")]
    InvalidMonth(u32),

    #[error("Day filter contains {0}, expected 1-31")]
    InvalidDay(u32),

    #[error("No calendar_id configured (set use_birthday_calendar = true to use the primary calendar)")]
    MissingCalendarId,

    #[error("only_contact_label is enabled but contact_label_id is empty")]
    MissingContactLabel,

    #[error("Page size must be between 1 and 1000, got {0}")]
    InvalidPageSize(u32),

    #[error("no_label_title must not be empty")]
    EmptyNoLabelTitle,
}

pub type SyncResult<T> = Result<T, SyncError>;
