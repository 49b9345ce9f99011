//! New-notice detection for the background search.
//!
//! Compares the stored snapshot with a fresh fetch and reports what the user
//! has not seen yet, for the "N new notices from X, Y" push message.

use std::collections::{BTreeSet, HashSet};

use crate::models::{Notification, Source};

/// Notices present in the fetch but not in the snapshot.
#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    /// New notices, in fetch order
    pub added: Vec<Notification>,
    /// Sources the new notices came from
    pub sources: BTreeSet<Source>,
}

impl DiffResult {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty()
    }

    pub fn count(&self) -> usize {
        self.added.len()
    }

    /// One-line summary such as `3 new notices from 教务处, 软件学院`.
    pub fn summary(&self) -> Option<String> {
        if !self.has_changes() {
            return None;
        }
        let sources: Vec<&str> = self.sources.iter().map(Source::as_str).collect();
        Some(format!(
            "{} new notice{} from {}",
            self.count(),
            if self.count() == 1 { "" } else { "s" },
            sources.join(", ")
        ))
    }
}

/// Compute which fetched notices are new relative to `previous`.
///
/// Identity is the notification identity; duplicates within `current` are
/// reported once.
pub fn calculate_diff(previous: &[Notification], current: &[Notification]) -> DiffResult {
    let mut seen: HashSet<&Notification> = previous.iter().collect();
    let mut result = DiffResult::default();

    for notification in current {
        if seen.insert(notification) {
            result.sources.insert(notification.source);
            result.added.push(notification.clone());
        }
    }
    result
}
