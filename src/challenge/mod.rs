// src/challenge/mod.rs

//! Anti-bot challenge solver.
//!
//! Some campus sites answer the first request with a page whose inline script
//! carries a challenge id and its precomputed answer. Posting both back,
//! together with a browser fingerprint, yields a `client_id` cookie that
//! unlocks the listing for a day. The solver caches that id per landing URL
//! and hands out an HTTP session with the cookie already set.

mod browser;
mod store;

pub use browser::{BrowserInfo, Fingerprint, OsFamily};
pub use store::{BlobClientIdStore, ClientIdEntry, ClientIdStore, MemoryClientIdStore};

use std::sync::{Arc, OnceLock};

use regex::Regex;
use reqwest::cookie::Jar;
use reqwest::header::REFERER;
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ChallengeConfig, CrawlerConfig};
use crate::utils::http::{self, Page};

const CLIENT_ID_COOKIE: &str = "client_id";

/// Literals extracted from a challenge page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub id: String,
    pub answer: i64,
}

#[derive(Serialize)]
struct ChallengeAnswer<'a> {
    challenge_id: &'a str,
    answer: i64,
    browser_info: BrowserInfo<'a>,
}

fn challenge_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?m)(?:^|[;{]|\b(?:var|let|const))\s*challengeId\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
        )
        .expect("challenge id pattern is valid")
    })
}

fn answer_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)(?:^|[;{]|\b(?:var|let|const))\s*answer\s*=\s*([+-]?\d+)")
            .expect("answer pattern is valid")
    })
}

fn script_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("script").expect("script selector is valid"))
}

/// Find the challenge literals in a page's inline scripts.
///
/// Both literals must be present for a page to count as a challenge.
pub fn parse_challenge(body: &str) -> Option<Challenge> {
    let document = Html::parse_document(body);
    let mut id = None;
    let mut answer = None;

    for script in document.select(script_selector()) {
        let text: String = script.text().collect();
        if id.is_none() {
            id = challenge_id_regex().captures(&text).and_then(|caps| {
                caps.get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str().to_string())
            });
        }
        if answer.is_none() {
            answer = answer_regex()
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<i64>().ok());
        }
    }

    Some(Challenge {
        id: id?,
        answer: answer?,
    })
}

/// An HTTP session that has passed (or did not need) the challenge.
#[derive(Debug, Clone)]
pub struct Session {
    client: reqwest::Client,
}

impl Session {
    /// GET a page through this session.
    pub async fn get(&self, url: &Url) -> Result<Page> {
        http::fetch_page(&self.client, url).await
    }
}

/// Opens sessions against guarded sites, solving the challenge when needed.
pub struct ChallengeSolver {
    crawler: CrawlerConfig,
    config: ChallengeConfig,
    store: Arc<dyn ClientIdStore>,
    os: OsFamily,
}

impl ChallengeSolver {
    pub fn new(
        crawler: &CrawlerConfig,
        config: &ChallengeConfig,
        store: Arc<dyn ClientIdStore>,
    ) -> Self {
        Self {
            crawler: crawler.clone(),
            config: config.clone(),
            store,
            os: OsFamily::current(),
        }
    }

    /// Pretend to be a different operating system family.
    pub fn with_os(mut self, os: OsFamily) -> Self {
        self.os = os;
        self
    }

    /// Open a session for `landing`.
    ///
    /// Makes one attempt; a failed handshake is `ChallengeUnsolved`.
    pub async fn open(&self, landing: &Url) -> Result<Session> {
        let fingerprint = Fingerprint::random(self.os);
        let jar = Arc::new(Jar::default());
        let key = landing.as_str();

        if let Some(entry) = self.store.get(key).await? {
            log::debug!("Reusing cached client id for {}", landing);
            jar.add_cookie_str(&client_id_cookie(&entry.client_id), landing);
        }

        let client = http::create_client(&self.crawler, &fingerprint.user_agent, jar.clone())?;
        let session = Session { client };

        let response = session.client.get(landing.clone()).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = String::from_utf8_lossy(&bytes);

        let Some(challenge) = parse_challenge(&body) else {
            if !status.is_success() {
                return Err(AppError::Network(format!("HTTP {status} from {landing}")));
            }
            return Ok(session);
        };

        log::debug!("Challenge {} found on {}", challenge.id, landing);
        let client_id = self.submit(&session, landing, &challenge, &fingerprint).await?;

        jar.add_cookie_str(&client_id_cookie(&client_id), landing);
        self.store
            .put(
                key,
                ClientIdEntry::acquired_now(client_id, self.config.ttl_hours),
            )
            .await?;
        log::info!("Passed site verification for {}", landing);

        Ok(session)
    }

    async fn submit(
        &self,
        session: &Session,
        landing: &Url,
        challenge: &Challenge,
        fingerprint: &Fingerprint,
    ) -> Result<String> {
        let endpoint = landing.join(&self.config.endpoint_path)?;
        let payload = ChallengeAnswer {
            challenge_id: &challenge.id,
            answer: challenge.answer,
            browser_info: fingerprint.browser_info(),
        };

        let response = session
            .client
            .post(endpoint)
            .header(REFERER, landing.as_str())
            .json(&payload)
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            log::warn!(
                "Challenge endpoint for {} answered {}",
                landing,
                response.status()
            );
            return Err(AppError::ChallengeUnsolved(landing.to_string()));
        }

        let from_cookie = response
            .cookies()
            .find(|c| c.name() == CLIENT_ID_COOKIE)
            .map(|c| c.value().to_string());
        let body: Option<Value> = response.json().await.ok();
        let from_body = body
            .as_ref()
            .and_then(|v| v.get(CLIENT_ID_COOKIE))
            .and_then(Value::as_str)
            .map(str::to_string);

        from_body
            .or(from_cookie)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::ChallengeUnsolved(landing.to_string()))
    }
}

fn client_id_cookie(client_id: &str) -> String {
    format!("{CLIENT_ID_COOKIE}={client_id}; Path=/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_double_quotes() {
        let body = r#"<html><head><script>
            var challengeId = "c-123";
            var answer = 42;
        </script></head></html>"#;
        assert_eq!(
            parse_challenge(body),
            Some(Challenge {
                id: "c-123".into(),
                answer: 42
            })
        );
    }

    #[test]
    fn test_parse_const_single_quotes_negative() {
        let body = "<script>const challengeId='abc';</script><script>let answer =  -17 ;</script>";
        assert_eq!(
            parse_challenge(body),
            Some(Challenge {
                id: "abc".into(),
                answer: -17
            })
        );
    }

    #[test]
    fn test_parse_no_keyword() {
        let body = "<script>challengeId = \"x\"; answer=7</script>";
        let challenge = parse_challenge(body).unwrap();
        assert_eq!(challenge.id, "x");
        assert_eq!(challenge.answer, 7);
    }

    #[test]
    fn test_partial_challenge_is_none() {
        assert!(parse_challenge("<script>var challengeId = 'x';</script>").is_none());
        assert!(parse_challenge("<script>var answer = 3;</script>").is_none());
    }

    #[test]
    fn test_literals_outside_script_ignored() {
        let body = "<p>challengeId = 'x'; answer = 3</p>";
        assert!(parse_challenge(body).is_none());
    }

    #[test]
    fn test_answer_identifier_boundary() {
        let body = "<script>var challengeId='x'; var myanswer = 5; var answer = 9;</script>";
        assert_eq!(parse_challenge(body).unwrap().answer, 9);
    }

    #[test]
    fn test_member_assignment_is_not_a_declaration() {
        let body = "<script>var challengeId='x'; window.answer = 5;\nform.challengeId = 'y';\nanswer = 9;</script>";
        assert_eq!(
            parse_challenge(body),
            Some(Challenge {
                id: "x".into(),
                answer: 9
            })
        );
    }

    #[test]
    fn test_cookie_string() {
        assert_eq!(client_id_cookie("abc"), "client_id=abc; Path=/");
    }
}
