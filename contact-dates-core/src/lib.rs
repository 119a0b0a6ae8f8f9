//! Core engine for contact-dates.
//!
//! Turns the birthdays and special dates stored on directory contacts into
//! annually recurring calendar events, and sweeps those events away again on
//! request. The remote directory and calendar are reached only through the
//! capability traits in [`service`]; everything else is plain data and pure
//! functions plus the two orchestrators:
//! - [`sync::run_sync`] creates missing events, exactly once per (title, day)
//! - [`sweep::run_deletion_sweep`] deletes previously created events

pub mod config;
pub mod contact;
pub mod error;
pub mod event;
pub mod filter;
pub mod format;
pub mod labels;
pub mod oracle;
pub mod pager;
pub mod recurrence;
pub mod service;
pub mod sweep;
pub mod sync;
pub mod writer;

#[cfg(test)]
pub(crate) mod memory;

pub use config::{RunConfig, Target};
pub use contact::{ContactDate, ContactRecord, DateFact, FactKind, LabelMembership};
pub use error::{ConfigError, SyncError};
pub use service::{CalendarService, DirectoryService, Lookup, ServiceError};
pub use sweep::{SweepOutcome, run_deletion_sweep};
pub use sync::{RunState, SyncReport, SyncStats, run_sync};
