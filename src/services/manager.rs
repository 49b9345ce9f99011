// src/services/manager.rs

//! Subscription state and rule-based filtering.
//!
//! A notification is shown when its source is subscribed and either the
//! source has no enabled ruleset, or at least one enabled ruleset accepts it.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value, json};

use crate::crawlers::CrawlerRegistry;
use crate::error::{AppError, Result};
use crate::models::{Notification, Source};
use crate::rules::{Ruleset, RulesetId};

/// Owns the subscribed sources and their rulesets.
///
/// Rulesets of a source that is no longer subscribed may be kept around, so
/// that switching a source off and on again does not lose its rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationManager {
    subscription: BTreeSet<Source>,
    ruleset: BTreeMap<Source, Vec<Ruleset>>,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `source`, appending `rulesets` to its list.
    ///
    /// Subscribing twice is a no-op; rulesets passed the second time are
    /// discarded.
    pub fn add_subscription(&mut self, source: Source, rulesets: impl IntoIterator<Item = Ruleset>) {
        if !self.subscription.insert(source) {
            return;
        }
        let rulesets: Vec<Ruleset> = rulesets.into_iter().collect();
        if !rulesets.is_empty() {
            self.ruleset.entry(source).or_default().extend(rulesets);
        }
    }

    /// Unsubscribe from `source`, optionally keeping its rulesets.
    pub fn remove_subscription(&mut self, source: Source, remove_ruleset: bool) -> Result<()> {
        if !self.subscription.remove(&source) {
            return Err(AppError::NotSubscribed(source));
        }
        if remove_ruleset {
            self.ruleset.remove(&source);
        }
        Ok(())
    }

    fn ensure_subscribed(&self, source: Source) -> Result<()> {
        if self.subscription.contains(&source) {
            Ok(())
        } else {
            Err(AppError::NotSubscribed(source))
        }
    }

    pub fn add_ruleset(&mut self, source: Source, ruleset: Ruleset) -> Result<()> {
        self.add_rulesets(source, [ruleset])
    }

    pub fn add_rulesets(
        &mut self,
        source: Source,
        rulesets: impl IntoIterator<Item = Ruleset>,
    ) -> Result<()> {
        self.ensure_subscribed(source)?;
        self.ruleset.entry(source).or_default().extend(rulesets);
        Ok(())
    }

    /// Remove the ruleset with identity `id`, returning it.
    pub fn remove_ruleset(&mut self, source: Source, id: RulesetId) -> Result<Ruleset> {
        self.ensure_subscribed(source)?;
        let list = self
            .ruleset
            .get_mut(&source)
            .ok_or(AppError::RulesetNotFound(source))?;
        let index = list
            .iter()
            .position(|r| r.id() == id)
            .ok_or(AppError::RulesetNotFound(source))?;
        Ok(list.remove(index))
    }

    /// Drop every ruleset of `source`. Succeeds even if it had none.
    pub fn remove_rulesets(&mut self, source: Source) -> Result<()> {
        self.ensure_subscribed(source)?;
        self.ruleset.remove(&source);
        Ok(())
    }

    /// Store an edited copy of a ruleset in place of the original, or append
    /// it when the original is gone.
    pub fn replace_ruleset(&mut self, source: Source, ruleset: Ruleset) -> Result<()> {
        self.ensure_subscribed(source)?;
        let list = self.ruleset.entry(source).or_default();
        match list.iter_mut().find(|r| r.id() == ruleset.id()) {
            Some(slot) => *slot = ruleset,
            None => list.push(ruleset),
        }
        Ok(())
    }

    pub fn ruleset_mut(&mut self, source: Source, id: RulesetId) -> Result<&mut Ruleset> {
        self.ensure_subscribed(source)?;
        self.ruleset
            .get_mut(&source)
            .and_then(|list| list.iter_mut().find(|r| r.id() == id))
            .ok_or(AppError::RulesetNotFound(source))
    }

    /// Rulesets registered for `source`, subscribed or not.
    pub fn rulesets(&self, source: Source) -> &[Ruleset] {
        self.ruleset.get(&source).map(Vec::as_slice).unwrap_or_default()
    }

    /// Subscribed sources in enumeration order.
    pub fn subscriptions(&self) -> impl Iterator<Item = Source> + '_ {
        self.subscription.iter().copied()
    }

    pub fn is_subscribed(&self, source: Source) -> bool {
        self.subscription.contains(&source)
    }

    /// Whether any subscribed source is filtered by an enabled ruleset.
    pub fn has_active_rules(&self) -> bool {
        self.subscription
            .iter()
            .any(|source| self.rulesets(*source).iter().any(|r| r.enable))
    }

    fn accepted_by_rules(&self, notification: &Notification) -> bool {
        let mut enabled = self
            .rulesets(notification.source)
            .iter()
            .filter(|r| r.enable)
            .peekable();
        if enabled.peek().is_none() {
            return true;
        }
        enabled.any(|r| r.eval(notification))
    }

    /// Whether `notification` should be shown.
    ///
    /// Notifications from unsubscribed sources are rejected when
    /// `drop_unsubscribed` is set, and otherwise judged by whatever rulesets
    /// the source still has.
    pub fn passes(&self, notification: &Notification, drop_unsubscribed: bool) -> bool {
        if drop_unsubscribed && !self.is_subscribed(notification.source) {
            return false;
        }
        self.accepted_by_rules(notification)
    }

    pub fn filter(
        &self,
        notifications: impl IntoIterator<Item = Notification>,
        drop_unsubscribed: bool,
    ) -> Vec<Notification> {
        notifications
            .into_iter()
            .filter(|n| self.passes(n, drop_unsubscribed))
            .collect()
    }

    /// Fetch every subscribed source in order and keep what the rules accept.
    ///
    /// The first crawler failure aborts the fetch.
    pub async fn fetch(&self, registry: &CrawlerRegistry, pages: usize) -> Result<Vec<Notification>> {
        let mut survivors = Vec::new();
        for source in self.subscriptions() {
            let crawler = registry.create(source, pages)?;
            let fetched = crawler.fetch().await?;
            let total = fetched.len();
            let kept = self.filter(fetched, true);
            log::info!("{}: {} fetched, {} kept", source, total, kept.len());
            survivors.extend(kept);
        }
        Ok(survivors)
    }

    /// Serialize subscriptions and rulesets to the config blob shape.
    pub fn dump_config(&self) -> Value {
        let subscription: Vec<&str> = self.subscription.iter().map(Source::as_str).collect();
        let ruleset: Map<String, Value> = self
            .ruleset
            .iter()
            .map(|(source, list)| {
                (
                    source.as_str().to_string(),
                    Value::Array(list.iter().map(Ruleset::dump).collect()),
                )
            })
            .collect();
        json!({ "subscription": subscription, "ruleset": ruleset })
    }

    /// Rebuild a manager from a config blob; `None` gives an empty manager.
    ///
    /// Rulesets of unsubscribed sources are accepted.
    pub fn load_or_create(data: Option<&Value>) -> Result<Self> {
        let Some(data) = data else {
            return Ok(Self::new());
        };
        let mut manager = Self::new();

        match data.get("subscription") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for item in items {
                    let name = item
                        .as_str()
                        .ok_or_else(|| AppError::validation(format!("subscription entry {item}")))?;
                    manager.subscription.insert(Source::from_display(name)?);
                }
            }
            Some(other) => {
                return Err(AppError::validation(format!("subscription is not a list: {other}")));
            }
        }

        match data.get("ruleset") {
            None | Some(Value::Null) => {}
            Some(Value::Object(map)) => {
                for (name, list) in map {
                    let source = Source::from_display(name)?;
                    let items = list.as_array().ok_or_else(|| {
                        AppError::validation(format!("rulesets of {name} are not a list"))
                    })?;
                    let rulesets = items.iter().map(Ruleset::load).collect::<Result<Vec<_>>>()?;
                    manager.ruleset.insert(source, rulesets);
                }
            }
            Some(other) => {
                return Err(AppError::validation(format!("ruleset is not a map: {other}")));
            }
        }

        Ok(manager)
    }
}
