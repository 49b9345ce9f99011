// src/utils/http.rs

//! HTTP client utilities.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use url::Url;

use crate::error::Result;
use crate::models::CrawlerConfig;

/// A fetched page: the final URL after redirects and the decoded body.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub body: String,
}

/// Create an asynchronous HTTP client sharing the given cookie jar.
pub fn create_client(
    config: &CrawlerConfig,
    user_agent: &str,
    jar: Arc<Jar>,
) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .cookie_provider(jar)
        .build()?;
    Ok(client)
}

/// GET a page and decode it as UTF-8.
///
/// The campus sites mislabel their charset, so the declared encoding is
/// ignored and invalid sequences are replaced.
pub async fn fetch_page(client: &reqwest::Client, url: &Url) -> Result<Page> {
    let response = client.get(url.clone()).send().await?.error_for_status()?;
    let final_url = response.url().clone();
    let bytes = response.bytes().await?;
    Ok(Page {
        url: final_url,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}
