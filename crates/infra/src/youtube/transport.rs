use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, StatusCode};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::youtube::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("connection failed: {0}")]
    Connection(String),
}

/// One `commentThreads.list` page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery<'a> {
    pub video_id: &'a str,
    pub page_size: u32,
    pub page_token: Option<&'a str>,
}

/// Upstream response as seen by the pagination loop, before any decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub status: u16,
    pub retry_after: Option<String>,
    pub body: String,
}

impl RawPage {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_throttled(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS.as_u16() || self.status >= 500
    }

    /// `Retry-After` in whole seconds; HTTP-date values are not honoured.
    pub fn retry_after_delay(&self) -> Option<Duration> {
        self.retry_after
            .as_deref()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

pub trait CommentsTransport: Send + Sync {
    fn fetch_page(
        &self,
        query: &PageQuery<'_>,
    ) -> impl Future<Output = Result<RawPage, TransportError>> + Send;
}

#[derive(Clone)]
pub struct YoutubeHttpTransport {
    http: Client,
    base_url: String,
    api_key: String,
    request_timeout: Duration,
    retry: RetryPolicy,
}

impl fmt::Debug for YoutubeHttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YoutubeHttpTransport")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl YoutubeHttpTransport {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        request_timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            request_timeout,
            retry,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/commentThreads", self.base_url.trim_end_matches('/'))
    }

    fn params(&self, query: &PageQuery<'_>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("key", self.api_key.clone()),
            ("videoId", query.video_id.to_string()),
            ("part", "snippet".to_string()),
            ("maxResults", query.page_size.to_string()),
            ("order", "time".to_string()),
        ];
        if let Some(token) = query.page_token {
            params.push(("pageToken", token.to_string()));
        }
        params
    }

    async fn send_once(&self, query: &PageQuery<'_>) -> Result<RawPage, reqwest::Error> {
        let response = self
            .http
            .request(Method::GET, self.endpoint())
            .query(&self.params(query))
            .timeout(self.request_timeout)
            .send()
            .await?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        Ok(RawPage {
            status,
            retry_after,
            body,
        })
    }
}

impl CommentsTransport for YoutubeHttpTransport {
    async fn fetch_page(&self, query: &PageQuery<'_>) -> Result<RawPage, TransportError> {
        let can_retry = self.retry.allows_method(&Method::GET);
        let mut attempt = 0;
        loop {
            match self.send_once(query).await {
                Ok(page)
                    if can_retry
                        && self.retry.is_retryable_status(page.status)
                        && self.retry.has_budget(attempt) =>
                {
                    let wait = self.retry.backoff(attempt);
                    debug!(
                        video_id = query.video_id,
                        status = page.status,
                        attempt = attempt + 1,
                        wait_ms = wait.as_millis() as u64,
                        "retrying comment page request"
                    );
                    sleep(wait).await;
                }
                Ok(page) => return Ok(page),
                Err(err) if can_retry && err.is_connect() && self.retry.has_budget(attempt) => {
                    let wait = self.retry.backoff(attempt);
                    warn!(
                        video_id = query.video_id,
                        error = %err,
                        attempt = attempt + 1,
                        wait_ms = wait.as_millis() as u64,
                        "connection failed; retrying"
                    );
                    sleep(wait).await;
                }
                Err(err) if err.is_connect() => {
                    return Err(TransportError::Connection(err.to_string()));
                }
                Err(err) => return Err(err.into()),
            }
            attempt += 1;
        }
    }
}
