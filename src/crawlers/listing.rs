// src/crawlers/listing.rs

//! Paginated HTML listing crawler shared by the campus sites.
//!
//! Each site is described by a [`Site`] constant: where its listing columns
//! live and which CSS selectors pick out rows, fields and the next-page anchor.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::challenge::{ChallengeSolver, Session};
use crate::crawlers::Crawler;
use crate::error::{AppError, Result};
use crate::models::{Notification, Source, dedup, today};
use crate::utils::resolve_url;

/// CSS selectors for one site's listing page.
///
/// `row`, `next_first` and `next_rest` apply to the whole document; the other
/// selectors apply within a row.
#[derive(Debug, Clone, Copy)]
pub struct ListingLayout {
    pub row: &'static str,
    pub title: &'static str,
    /// Only direct text children of the title element count (nested labels
    /// are skipped)
    pub title_own_text: bool,
    pub link: &'static str,
    pub date: Option<&'static str>,
    /// Category label inside the row, brackets stripped
    pub tag: Option<&'static str>,
    /// Next-page anchor on the first page of a column
    pub next_first: &'static str,
    /// Next-page anchor on every later page
    pub next_rest: &'static str,
}

/// A listing column and the tag attached to everything found in it.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub path: &'static str,
    pub tag: Option<&'static str>,
}

/// Static description of a crawlable site.
#[derive(Debug)]
pub struct Site {
    pub source: Source,
    pub origin: &'static str,
    /// Page used for the challenge handshake
    pub landing: &'static str,
    pub columns: &'static [Column],
    pub layout: ListingLayout,
}

/// One parsed listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub title: String,
    pub href: String,
    pub date: Option<NaiveDate>,
    pub tag: Option<String>,
}

/// One parsed listing page.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub rows: Vec<ListingRow>,
    pub next: Option<String>,
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{4})\s*[-/.年]\s*(\d{1,2})\s*[-/.月]\s*(\d{1,2})")
            .expect("date pattern is valid")
    })
}

/// Find a calendar date in listing text such as `2025-02-14` or `[2025/2/14]`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let caps = date_regex().captures(text)?;
    NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_label(s: &str) -> String {
    s.trim()
        .trim_start_matches(['[', '【'])
        .trim_end_matches([']', '】'])
        .trim()
        .to_string()
}

fn own_text(element: &ElementRef) -> String {
    element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(&**text),
            _ => None,
        })
        .collect()
}

/// Parse one listing page.
///
/// Rows without a title or a link are skipped.
pub fn parse_listing(html: &str, layout: &ListingLayout, first_page: bool) -> Result<ListingPage> {
    let document = Html::parse_document(html);

    let row_sel = parse_selector(layout.row)?;
    let title_sel = parse_selector(layout.title)?;
    let link_sel = parse_selector(layout.link)?;
    let date_sel = layout.date.map(parse_selector).transpose()?;
    let tag_sel = layout.tag.map(parse_selector).transpose()?;
    let next_sel = parse_selector(if first_page {
        layout.next_first
    } else {
        layout.next_rest
    })?;

    let mut rows = Vec::new();
    for row in document.select(&row_sel) {
        let Some(title_elem) = row.select(&title_sel).next() else {
            continue;
        };
        let raw_title = if layout.title_own_text {
            own_text(&title_elem)
        } else {
            title_elem.text().collect()
        };
        let title = normalize_whitespace(&raw_title);
        let href = row
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .unwrap_or_default();
        if title.is_empty() || href.is_empty() {
            continue;
        }

        let date = date_sel
            .as_ref()
            .and_then(|sel| row.select(sel).next())
            .and_then(|el| parse_date(&el.text().collect::<String>()));
        let tag = tag_sel
            .as_ref()
            .and_then(|sel| row.select(sel).next())
            .map(|el| strip_label(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty());

        rows.push(ListingRow {
            title,
            href: href.to_string(),
            date,
            tag,
        });
    }

    let next = document
        .select(&next_sel)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && !href.starts_with("javascript:"))
        .map(str::to_string);

    Ok(ListingPage { rows, next })
}

/// Crawler walking every column of a [`Site`].
pub struct ListingCrawler {
    site: &'static Site,
    pages: usize,
    origin: Option<Url>,
    solver: Arc<ChallengeSolver>,
    delay: Duration,
}

impl ListingCrawler {
    pub fn new(site: &'static Site, pages: usize, solver: Arc<ChallengeSolver>) -> Self {
        Self {
            site,
            pages: pages.max(1),
            origin: None,
            solver,
            delay: Duration::ZERO,
        }
    }

    /// Point the crawler at a different host (mirrors, tests).
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Pause between consecutive page requests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn origin(&self) -> Result<Url> {
        match &self.origin {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(self.site.origin)?),
        }
    }

    async fn walk_column(
        &self,
        session: &Session,
        origin: &Url,
        column: &Column,
    ) -> Result<Vec<Notification>> {
        let mut url = origin.join(column.path)?;
        let mut visited = HashSet::new();
        let mut notifications = Vec::new();

        for page_index in 0..self.pages {
            if !visited.insert(url.to_string()) {
                log::debug!("{} pagination looped back to {}", self.site.source, url);
                break;
            }
            if page_index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let page = session.get(&url).await?;
            let listing = parse_listing(&page.body, &self.site.layout, page_index == 0)?;
            log::debug!(
                "{} page {} ({}): {} rows",
                self.site.source,
                page_index + 1,
                page.url,
                listing.rows.len()
            );

            notifications.extend(
                listing
                    .rows
                    .into_iter()
                    .filter_map(|row| self.to_notification(row, column, &page.url)),
            );

            match listing.next {
                Some(href) => url = page.url.join(&href)?,
                None => break,
            }
        }

        Ok(notifications)
    }

    /// Rows whose link cannot be made absolute are skipped.
    fn to_notification(
        &self,
        row: ListingRow,
        column: &Column,
        page_url: &Url,
    ) -> Option<Notification> {
        let Some(link) = resolve_url(page_url, &row.href) else {
            log::debug!("{}: skipping {:?}, bad link {:?}", self.site.source, row.title, row.href);
            return None;
        };
        let date = row.date.unwrap_or_else(|| {
            log::debug!("{}", AppError::missing_field("date", link.as_str()));
            today()
        });
        let notification = Notification::new(row.title, link, self.site.source)
            .with_date(date)
            .with_tags(row.tag.into_iter().chain(column.tag.map(str::to_string)));
        Some(notification)
    }
}

#[async_trait]
impl Crawler for ListingCrawler {
    fn source(&self) -> Source {
        self.site.source
    }

    async fn fetch(&self) -> Result<Vec<Notification>> {
        let origin = self.origin()?;
        let landing = origin.join(self.site.landing)?;
        let session = self.solver.open(&landing).await?;

        let mut notifications = Vec::new();
        for column in self.site.columns {
            notifications.extend(self.walk_column(&session, &origin, column).await?);
        }
        Ok(dedup(notifications))
    }
}
