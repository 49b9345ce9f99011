// src/crawlers/mod.rs

//! Per-source notification crawlers.
//!
//! Every [`Source`] has exactly one crawler constructor registered in a
//! [`CrawlerRegistry`]. A crawler walks up to `pages` listing pages and
//! returns the rows it found as deduplicated [`Notification`]s.

pub mod gs;
pub mod jwc;
pub mod listing;
pub mod se;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::challenge::ChallengeSolver;
use crate::error::{AppError, Result};
use crate::models::{Notification, Source};

pub use listing::{ListingCrawler, Site};

/// Fetches the current listing of one source.
#[async_trait]
pub trait Crawler: Send + Sync {
    fn source(&self) -> Source;

    /// Walk the listing. No two returned notifications are equal.
    async fn fetch(&self) -> Result<Vec<Notification>>;
}

type Constructor = Box<dyn Fn(usize) -> Box<dyn Crawler> + Send + Sync>;

/// Source to crawler-constructor mapping, populated at startup.
#[derive(Default)]
pub struct CrawlerRegistry {
    constructors: HashMap<Source, Constructor>,
}

impl CrawlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the constructor for `source`.
    pub fn register<F>(&mut self, source: Source, constructor: F) -> &mut Self
    where
        F: Fn(usize) -> Box<dyn Crawler> + Send + Sync + 'static,
    {
        self.constructors.insert(source, Box::new(constructor));
        self
    }

    /// Build the crawler for `source`, walking `pages` listing pages.
    pub fn create(&self, source: Source, pages: usize) -> Result<Box<dyn Crawler>> {
        let constructor = self
            .constructors
            .get(&source)
            .ok_or_else(|| AppError::crawl(source.as_str(), "no crawler registered"))?;
        Ok(constructor(pages.max(1)))
    }

    /// Registered sources in enumeration order.
    pub fn sources(&self) -> Vec<Source> {
        let mut sources: Vec<Source> = self.constructors.keys().copied().collect();
        sources.sort();
        sources
    }

    /// Registry with the three campus site crawlers sharing one solver.
    pub fn standard(ctx: CrawlContext) -> Self {
        let ctx = Arc::new(ctx);
        let mut registry = Self::new();
        for site in [&jwc::SITE, &gs::SITE, &se::SITE] {
            let ctx = Arc::clone(&ctx);
            registry.register(site.source, move |pages| {
                Box::new(ctx.listing_crawler(site, pages)) as Box<dyn Crawler>
            });
        }
        registry
    }
}

/// Shared dependencies of the site crawlers.
pub struct CrawlContext {
    solver: Arc<ChallengeSolver>,
    origins: HashMap<Source, Url>,
    delay: Duration,
}

impl CrawlContext {
    pub fn new(solver: Arc<ChallengeSolver>) -> Self {
        Self {
            solver,
            origins: HashMap::new(),
            delay: Duration::ZERO,
        }
    }

    /// Crawl `source` from `origin` instead of its public host.
    pub fn with_origin(mut self, source: Source, origin: Url) -> Self {
        self.origins.insert(source, origin);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn listing_crawler(&self, site: &'static Site, pages: usize) -> ListingCrawler {
        let crawler = ListingCrawler::new(site, pages, Arc::clone(&self.solver)).with_delay(self.delay);
        match self.origins.get(&site.source) {
            Some(origin) => crawler.with_origin(origin.clone()),
            None => crawler,
        }
    }
}
