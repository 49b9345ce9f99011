//! Notification data structure.

use std::collections::{BTreeSet, HashSet};
use std::hash::{Hash, Hasher};

use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::Source;

/// A notice scraped from one of the campus sites.
///
/// Identity is `(title, link, source)`; description, tags, date and read state
/// do not take part in equality or hashing.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Notice title
    pub title: String,

    /// Absolute URL of the notice page
    pub link: String,

    /// Site the notice came from
    pub source: Source,

    /// Free-form description, usually empty
    pub description: String,

    /// Category labels
    pub tags: BTreeSet<String>,

    /// Publication date
    pub date: NaiveDate,

    /// Whether the user has opened it
    pub is_read: bool,
}

/// On-disk shape, with the source kept as a raw string so that an unknown
/// source can be reported separately from a malformed entry.
#[derive(Deserialize)]
struct StoredNotification {
    title: String,
    link: String,
    source: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default)]
    is_read: bool,
}

/// Today's date in local time.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl Notification {
    /// Create an unread notification dated today with no tags.
    pub fn new(title: impl Into<String>, link: impl Into<String>, source: Source) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            source,
            description: String::new(),
            tags: BTreeSet::new(),
            date: today(),
            is_read: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach tags; duplicates collapse.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Serialize into the cache blob format.
    pub fn dump(&self) -> Value {
        serde_json::json!({
            "title": self.title,
            "link": self.link,
            "source": self.source.as_str(),
            "description": self.description,
            "tags": self.tags.iter().collect::<Vec<_>>(),
            "date": self.date.format("%Y-%m-%d").to_string(),
            "is_read": self.is_read,
        })
    }

    /// Decode one cache entry.
    ///
    /// Fails with `UnknownSource` when the source string is not registered and
    /// with `CorruptCache` for any other malformation.
    pub fn load(value: &Value) -> Result<Self> {
        let stored = StoredNotification::deserialize(value).map_err(AppError::corrupt)?;
        let source = Source::from_display(&stored.source)?;
        Ok(Self {
            title: stored.title,
            link: stored.link,
            source,
            description: stored.description,
            tags: stored.tags.into_iter().collect(),
            date: stored.date.unwrap_or_else(today),
            is_read: stored.is_read,
        })
    }

    /// Serialize a list into the cache blob format.
    pub fn dump_all<'a>(notifications: impl IntoIterator<Item = &'a Notification>) -> Value {
        Value::Array(notifications.into_iter().map(Notification::dump).collect())
    }

    /// Decode a whole cache blob.
    pub fn load_all(value: &Value) -> Result<Vec<Self>> {
        let entries = value
            .as_array()
            .ok_or_else(|| AppError::corrupt("notification cache is not a list"))?;
        entries.iter().map(Notification::load).collect()
    }
}

impl PartialEq for Notification {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title && self.link == other.link && self.source == other.source
    }
}

impl Eq for Notification {}

impl Hash for Notification {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.title.hash(state);
        self.link.hash(state);
        self.source.hash(state);
    }
}

/// Drop later duplicates, keeping first occurrences in order.
pub fn dedup(notifications: Vec<Notification>) -> Vec<Notification> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(notifications.len());
    for notification in notifications {
        if !seen.contains(&notification) {
            seen.insert(notification.clone());
            unique.push(notification);
        }
    }
    unique
}
