// src/pipeline/fetch.rs

//! Fetch pipeline: load state, fetch subscribed sources, merge, save.

use std::collections::BTreeSet;

use crate::crawlers::CrawlerRegistry;
use crate::error::Result;
use crate::models::{Config, Source};
use crate::services::inbox::{self, SortOrder};
use crate::storage::{self, BlobStore};

use super::diff::calculate_diff;

/// Pages walked when the notification cache is still empty.
const FIRST_FETCH_PAGES: usize = 2;

/// Outcome of one fetch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Notices that passed the rules
    pub fetched: usize,
    /// Notices not seen before
    pub added: usize,
    /// Size of the stored list afterwards
    pub total: usize,
    /// Sources that contributed new notices
    pub new_sources: BTreeSet<Source>,
}

/// Run one fetch against the configured stores.
///
/// `data` holds the subscription config, `cache` the notification list.
/// Without an explicit `pages`, an empty cache is seeded with two pages and
/// later runs walk `crawler.default_pages`.
pub async fn run_fetch(
    config: &Config,
    data: &dyn BlobStore,
    cache: &dyn BlobStore,
    registry: &CrawlerRegistry,
    pages: Option<usize>,
) -> Result<FetchSummary> {
    let manager = storage::load_manager(data, &config.storage.config_blob).await;
    let mut notifications =
        storage::load_notifications(cache, &config.storage.notifications_blob).await?;

    if manager.subscriptions().next().is_none() {
        log::warn!("No subscribed source; nothing to fetch");
        return Ok(FetchSummary {
            total: notifications.len(),
            ..FetchSummary::default()
        });
    }

    let pages = pages.unwrap_or(if notifications.is_empty() {
        FIRST_FETCH_PAGES
    } else {
        config.crawler.default_pages
    });
    log::info!("Fetching notices ({} page(s) per source)", pages);

    let fetched = manager.fetch(registry, pages).await?;
    let diff = calculate_diff(&notifications, &fetched);
    let fetched_count = fetched.len();
    let added = inbox::merge(&mut notifications, fetched);
    inbox::sort(&mut notifications, SortOrder::default());

    storage::save_notifications(cache, &config.storage.notifications_blob, &notifications).await?;

    if let Some(message) = diff.summary() {
        log::info!("{}", message);
    }

    Ok(FetchSummary {
        fetched: fetched_count,
        added: added.len(),
        total: notifications.len(),
        new_sources: diff.sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::crawlers::Crawler;
    use crate::models::Notification;
    use crate::rules::{Filter, Ruleset};
    use crate::services::NotificationManager;
    use crate::storage::MemoryBlobStore;

    struct Pages {
        pages: usize,
        seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Crawler for Pages {
        fn source(&self) -> Source {
            Source::Jwc
        }

        async fn fetch(&self) -> Result<Vec<Notification>> {
            self.seen.store(self.pages, Ordering::SeqCst);
            Ok((0..self.pages * 2)
                .map(|i| Notification::new(format!("选课 {i}"), format!("https://x/{i}"), Source::Jwc))
                .chain([Notification::new("考试", "https://x/exam", Source::Jwc)])
                .collect())
        }
    }

    fn registry(seen: &Arc<AtomicUsize>) -> CrawlerRegistry {
        let seen = Arc::clone(seen);
        let mut registry = CrawlerRegistry::new();
        registry.register(Source::Jwc, move |pages| {
            Box::new(Pages {
                pages,
                seen: Arc::clone(&seen),
            })
        });
        registry
    }

    #[tokio::test]
    async fn test_fetch_merges_and_saves() {
        let config = Config::default();
        let data = MemoryBlobStore::new();
        let cache = MemoryBlobStore::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let mut manager = NotificationManager::new();
        manager.add_subscription(
            Source::Jwc,
            [Ruleset::with_filters("选课", [Filter::title_contains("选课")])],
        );
        storage::save_manager(&data, &config.storage.config_blob, &manager)
            .await
            .unwrap();

        let first = run_fetch(&config, &data, &cache, &registry(&seen), None)
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), FIRST_FETCH_PAGES);
        assert_eq!(first.fetched, 4);
        assert_eq!(first.added, 4);
        assert_eq!(first.total, 4);
        assert!(first.new_sources.contains(&Source::Jwc));

        let second = run_fetch(&config, &data, &cache, &registry(&seen), None)
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), config.crawler.default_pages);
        assert_eq!(second.added, 0);
        assert_eq!(second.total, 4);
        assert!(second.new_sources.is_empty());

        let stored = storage::load_notifications(&cache, &config.storage.notifications_blob)
            .await
            .unwrap();
        assert_eq!(stored.len(), 4);
        assert!(stored.iter().all(|n| n.title.contains("选课")));
    }

    #[tokio::test]
    async fn test_no_subscription_skips() {
        let config = Config::default();
        let seen = Arc::new(AtomicUsize::new(0));
        let summary = run_fetch(
            &config,
            &MemoryBlobStore::new(),
            &MemoryBlobStore::new(),
            &registry(&seen),
            Some(3),
        )
        .await
        .unwrap();
        assert_eq!(summary, FetchSummary::default());
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }
}
