//! Collects every custom-event label in the directory.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::format::BIRTHDAY_LABEL;
use crate::pager::ContactPager;
use crate::service::DirectoryService;

/// Labels assumed present when the directory cannot be read.
pub const FALLBACK_LABELS: [&str; 3] = [BIRTHDAY_LABEL, "Anniversary", "Special Event"];

/// Walk the whole directory and gather the labels of custom dated events,
/// seeded with `"Birthday"` and `no_label_title`.
///
/// A directory failure abandons the walk and yields the fallback set instead.
/// Blank labels never make it into the set.
pub async fn collect_labels<D: DirectoryService + ?Sized>(
    directory: &D,
    page_size: u32,
    no_label_title: &str,
) -> BTreeSet<String> {
    let mut labels = BTreeSet::from([BIRTHDAY_LABEL.to_string()]);
    insert_label(&mut labels, no_label_title);
    let mut pager = ContactPager::new(directory, page_size);

    loop {
        match pager.next_page().await {
            Ok(Some(contacts)) => {
                let found = contacts
                    .iter()
                    .flat_map(|c| c.custom_events())
                    .filter_map(|e| e.label.as_deref());
                for label in found {
                    insert_label(&mut labels, label);
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Error getting event types: {}", e);
                return fallback_labels(no_label_title);
            }
        }
    }

    debug!(count = labels.len(), "Collected event labels");
    labels
}

fn fallback_labels(no_label_title: &str) -> BTreeSet<String> {
    let mut labels: BTreeSet<String> = FALLBACK_LABELS.iter().map(|l| l.to_string()).collect();
    insert_label(&mut labels, no_label_title);
    labels
}

fn insert_label(labels: &mut BTreeSet<String>, label: &str) {
    let label = label.trim();
    if !label.is_empty() {
        labels.insert(label.to_string());
    }
}
