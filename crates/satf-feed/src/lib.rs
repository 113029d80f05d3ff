//! Paginated HTTP client for the OCDS tender release feed.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use satf_core::RawRelease;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

pub const CRATE_NAME: &str = "satf-feed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retryable,
    NonRetryable,
}

pub fn classify_status(status: StatusCode) -> RetryDisposition {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        RetryDisposition::Retryable
    } else {
        RetryDisposition::NonRetryable
    }
}

pub fn classify_reqwest_error(err: &reqwest::Error) -> RetryDisposition {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        RetryDisposition::Retryable
    } else {
        RetryDisposition::NonRetryable
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl BackoffPolicy {
    pub fn delay_for_attempt(&self, attempt_index: usize) -> Duration {
        let factor = 1u32.checked_shl(attempt_index as u32).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor);
        delay.min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub backoff: BackoffPolicy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ocds-api.etenders.gov.za/api".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            user_agent: None,
            backoff: BackoffPolicy::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("feed returned {status} {status_text} for {url}")]
    HttpStatus {
        status: u16,
        status_text: String,
        url: String,
    },
}

/// Wire shape of the feed's list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleasePage {
    #[serde(default)]
    pub releases: Vec<RawRelease>,
}

/// Capability seam for the sync orchestrator: "can fetch one page of raw
/// releases". Production uses [`OcdsFeedClient`]; tests use in-memory fakes.
#[async_trait]
pub trait ReleaseFeed: Send + Sync {
    async fn fetch_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<Vec<RawRelease>, FeedError>;
}

#[derive(Debug)]
pub struct OcdsFeedClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    backoff: BackoffPolicy,
}

impl OcdsFeedClient {
    pub fn new(config: FeedConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().context("building reqwest client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            backoff: config.backoff,
        })
    }

    fn releases_url(&self, page_number: u32, page_size: u32) -> String {
        format!(
            "{}/releases?PageNumber={}&PageSize={}",
            self.base_url, page_number, page_size
        )
    }

    async fn fetch_page_once(&self, url: &str) -> Result<ReleasePage, reqwest::Error> {
        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let resp = request.send().await?.error_for_status()?;
        resp.json::<ReleasePage>().await
    }
}

#[async_trait]
impl ReleaseFeed for OcdsFeedClient {
    async fn fetch_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<Vec<RawRelease>, FeedError> {
        let url = self.releases_url(page_number, page_size);
        let mut last_request_error: Option<reqwest::Error> = None;

        for attempt in 0..=self.backoff.max_retries {
            match self.fetch_page_once(&url).await {
                Ok(page) => {
                    info!(
                        page_number,
                        page_size,
                        count = page.releases.len(),
                        "fetched feed page"
                    );
                    return Ok(page.releases);
                }
                Err(err) => {
                    if let Some(status) = err.status() {
                        if classify_status(status) == RetryDisposition::Retryable
                            && attempt < self.backoff.max_retries
                        {
                            tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
                            continue;
                        }
                        return Err(FeedError::HttpStatus {
                            status: status.as_u16(),
                            status_text: status
                                .canonical_reason()
                                .unwrap_or("unknown")
                                .to_string(),
                            url: url.clone(),
                        });
                    }
                    if classify_reqwest_error(&err) == RetryDisposition::Retryable
                        && attempt < self.backoff.max_retries
                    {
                        last_request_error = Some(err);
                        tokio::time::sleep(self.backoff.delay_for_attempt(attempt)).await;
                        continue;
                    }
                    return Err(FeedError::Request(err));
                }
            }
        }

        Err(FeedError::Request(
            last_request_error.expect("retry loop should capture a request error"),
        ))
    }
}
