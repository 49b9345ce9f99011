//! Operations on the stored notification list: merging fetched notices,
//! ordering and read state.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::Notification;

/// How the source column takes part in ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceOrder {
    /// Dates only
    Ignore,
    /// Group by source, in enumeration order
    #[default]
    Ascending,
    /// Group by source, reversed
    Descending,
}

/// Display order of the inbox. Unread notices always come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub by_source: SourceOrder,
    pub newest_first: bool,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            by_source: SourceOrder::Ascending,
            newest_first: true,
        }
    }
}

impl SortOrder {
    /// Newest first, sources mixed.
    pub fn by_date() -> Self {
        Self {
            by_source: SourceOrder::Ignore,
            newest_first: true,
        }
    }

    fn compare(&self, a: &Notification, b: &Notification) -> Ordering {
        let by_source = match self.by_source {
            SourceOrder::Ignore => Ordering::Equal,
            SourceOrder::Ascending => a.source.cmp(&b.source),
            SourceOrder::Descending => b.source.cmp(&a.source),
        };
        let by_date = if self.newest_first {
            b.date.cmp(&a.date)
        } else {
            a.date.cmp(&b.date)
        };
        a.is_read
            .cmp(&b.is_read)
            .then(by_source)
            .then(by_date)
    }
}

/// Append fetched notices that are not stored yet and return them.
///
/// Stored entries keep their read state; a fetched duplicate never replaces
/// one.
pub fn merge(existing: &mut Vec<Notification>, fetched: Vec<Notification>) -> Vec<Notification> {
    let mut known: HashSet<Notification> = existing.iter().cloned().collect();
    let mut added = Vec::new();
    for notification in fetched {
        if known.insert(notification.clone()) {
            existing.push(notification.clone());
            added.push(notification);
        }
    }
    added
}

/// Stable sort in display order.
pub fn sort(notifications: &mut [Notification], order: SortOrder) {
    notifications.sort_by(|a, b| order.compare(a, b));
}

/// Set the read flag of the stored copy of `target`. Returns whether it was
/// found.
pub fn mark_read(notifications: &mut [Notification], target: &Notification, read: bool) -> bool {
    match notifications.iter_mut().find(|n| *n == target) {
        Some(n) => {
            n.is_read = read;
            true
        }
        None => false,
    }
}

pub fn mark_all_read(notifications: &mut [Notification]) {
    notifications.iter_mut().for_each(|n| n.is_read = true);
}

pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.is_read).count()
}

/// Remove every notice, or only the read ones. Returns how many were removed.
pub fn purge(notifications: &mut Vec<Notification>, read_only: bool) -> usize {
    let before = notifications.len();
    if read_only {
        notifications.retain(|n| !n.is_read);
    } else {
        notifications.clear();
    }
    before - notifications.len()
}
