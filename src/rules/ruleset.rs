// src/rules/ruleset.rs

//! Named, switchable conjunctions of filters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::models::Notification;
use crate::rules::Filter;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle of a ruleset.
///
/// Not persisted: a ruleset loaded from disk gets a fresh id. Clones keep the
/// id, so an edited copy can replace its original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RulesetId(u64);

impl RulesetId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RulesetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A notification satisfies a ruleset when it satisfies every filter in it.
/// An empty ruleset matches everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ruleset {
    #[serde(skip, default = "RulesetId::next")]
    id: RulesetId,

    /// Display name, possibly empty
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    /// Disabled rulesets take no part in filtering
    #[serde(default = "enabled")]
    pub enable: bool,

    /// Filters, in display order
    #[serde(default)]
    pub filters: Vec<Filter>,
}

fn enabled() -> bool {
    true
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::new("")
    }
}

impl Ruleset {
    /// Create an enabled, empty ruleset.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RulesetId::next(),
            name: name.into(),
            enable: true,
            filters: Vec::new(),
        }
    }

    /// Create an enabled ruleset holding the given filters.
    pub fn with_filters(
        name: impl Into<String>,
        filters: impl IntoIterator<Item = Filter>,
    ) -> Self {
        let mut ruleset = Self::new(name);
        ruleset.add_filters(filters);
        ruleset
    }

    pub fn id(&self) -> RulesetId {
        self.id
    }

    pub fn add_filter(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    /// Remove the first filter equal to `filter`. Returns whether one was found.
    pub fn remove_filter(&mut self, filter: &Filter) -> bool {
        match self.filters.iter().position(|f| f == filter) {
            Some(index) => {
                self.filters.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn add_filters(&mut self, filters: impl IntoIterator<Item = Filter>) {
        self.filters.extend(filters);
    }

    /// Remove one occurrence of each given filter. Returns how many were removed.
    pub fn remove_filters<'a>(&mut self, filters: impl IntoIterator<Item = &'a Filter>) -> usize {
        filters
            .into_iter()
            .filter(|f| self.remove_filter(f))
            .count()
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    /// Conjunction over all filters, stopping at the first failure.
    pub fn eval(&self, notification: &Notification) -> bool {
        self.filters.iter().all(|f| f.eval(notification))
    }

    /// Filter descriptions joined with "and".
    pub fn describe(&self) -> String {
        self.filters
            .iter()
            .map(Filter::describe)
            .collect::<Vec<_>>()
            .join(" and ")
    }

    pub fn dump(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "enable": self.enable,
            "filters": self.filters.iter().map(Filter::dump).collect::<Vec<_>>(),
        })
    }

    pub fn load(value: &Value) -> Result<Self> {
        Ok(Ruleset::deserialize(value)?)
    }
}

/// Structural equality: name, enable flag and filter order. Identity is
/// compared separately through [`Ruleset::id`].
impl PartialEq for Ruleset {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.enable == other.enable && self.filters == other.filters
    }
}

impl Eq for Ruleset {}
