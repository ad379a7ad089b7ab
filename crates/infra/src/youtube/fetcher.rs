use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use pulse_core::domain::comments::Comment;
use pulse_core::types::time_window::TimeWindow;
use pulse_core::types::video_id::VideoId;

use crate::youtube::payload::{ThreadPage, UpstreamError, decode_comment};
use crate::youtube::transport::{CommentsTransport, PageQuery, RawPage};

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MAX_PAGES: usize = 10;
pub const DEFAULT_EARLY_STOP_COUNT: usize = 500;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("youtube api quota exceeded; try again later")]
    QuotaExceeded,
    #[error("video {video_id} not found or comments are disabled")]
    ResourceUnavailable { video_id: String },
    #[error("comment fetch failed: {0}")]
    Transient(String),
}

impl FetchError {
    /// Whether the whole request may succeed if issued again later.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::ResourceUnavailable { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub video_id: VideoId,
    pub window: TimeWindow,
    pub page_size: u32,
    pub max_pages: usize,
    pub early_stop_count: usize,
}

impl FetchRequest {
    pub fn new(video_id: VideoId) -> Self {
        Self {
            video_id,
            window: TimeWindow::unbounded(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            early_stop_count: DEFAULT_EARLY_STOP_COUNT,
        }
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_early_stop_count(mut self, early_stop_count: usize) -> Self {
        self.early_stop_count = early_stop_count;
        self
    }
}

/// Delays between successful pages and the fallback wait for throttled ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePacing {
    pub fast_pages: usize,
    pub fast_delay: Duration,
    pub slow_delay: Duration,
    pub rate_limit_fallback: Duration,
}

impl Default for PagePacing {
    fn default() -> Self {
        Self {
            fast_pages: 3,
            fast_delay: Duration::from_millis(300),
            slow_delay: Duration::from_millis(500),
            rate_limit_fallback: Duration::from_secs(5),
        }
    }
}

impl PagePacing {
    pub fn delay_after(&self, pages_fetched: usize) -> Duration {
        if pages_fetched <= self.fast_pages {
            self.fast_delay
        } else {
            self.slow_delay
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    PageLimit,
    EarlyStop,
    Exhausted,
    EmptyBody,
    Degraded,
}

impl StopReason {
    fn label(self) -> &'static str {
        match self {
            StopReason::PageLimit => "page_limit",
            StopReason::EarlyStop => "early_stop",
            StopReason::Exhausted => "exhausted",
            StopReason::EmptyBody => "empty_body",
            StopReason::Degraded => "degraded",
        }
    }
}

enum PageStatus {
    Ready,
    Throttled,
    Failed(FetchError),
}

/// Paginates `commentThreads` for one video at a time.
///
/// Holds no per-call state, so a single fetcher (and the connection pool
/// inside its transport) can serve concurrent fetches for different videos.
#[derive(Debug, Clone)]
pub struct CommentFetcher<T> {
    transport: T,
    pacing: PagePacing,
}

impl<T: CommentsTransport> CommentFetcher<T> {
    pub fn new(transport: T, pacing: PagePacing) -> Self {
        Self { transport, pacing }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns at most `early_stop_count` comments in upstream time order.
    ///
    /// Failures after at least one comment was collected end the fetch early
    /// and return what was gathered; the caller only sees a shorter list.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Comment>, FetchError> {
        let video_id = request.video_id.as_str();
        let started = Instant::now();
        let mut comments: Vec<Comment> = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;
        let mut skipped = 0usize;
        let mut throttle_retry_used = false;

        info!(
            video_id,
            page_size = request.page_size,
            max_pages = request.max_pages,
            early_stop_count = request.early_stop_count,
            "starting comment fetch"
        );

        let stop = loop {
            if pages >= request.max_pages {
                info!(video_id, max_pages = request.max_pages, "reached page limit");
                break StopReason::PageLimit;
            }
            if comments.len() >= request.early_stop_count {
                break StopReason::EarlyStop;
            }

            // A throttled retry re-enters here and is charged a page like any other request.
            pages += 1;
            let query = PageQuery {
                video_id,
                page_size: request.page_size,
                page_token: page_token.as_deref(),
            };
            info!(
                video_id,
                page = pages,
                token = page_token.as_deref().unwrap_or(""),
                "fetching comment page"
            );
            let raw = match self.transport.fetch_page(&query).await {
                Ok(raw) => raw,
                Err(err) => {
                    error!(video_id, page = pages, error = %err, "comment page request failed");
                    break degrade(video_id, comments.len(), FetchError::Transient(err.to_string()))?;
                }
            };

            match classify(&raw, video_id) {
                PageStatus::Ready => {}
                PageStatus::Throttled if !throttle_retry_used => {
                    throttle_retry_used = true;
                    let wait = raw
                        .retry_after_delay()
                        .unwrap_or(self.pacing.rate_limit_fallback);
                    warn!(
                        video_id,
                        page = pages,
                        status = raw.status,
                        wait_ms = wait.as_millis() as u64,
                        "rate limited or server error; retrying same page"
                    );
                    sleep(wait).await;
                    continue;
                }
                PageStatus::Throttled => {
                    error!(video_id, page = pages, status = raw.status, "page still throttled after retry");
                    let err = FetchError::Transient(format!(
                        "upstream returned status {} after retry",
                        raw.status
                    ));
                    break degrade(video_id, comments.len(), err)?;
                }
                PageStatus::Failed(err) => {
                    error!(video_id, page = pages, status = raw.status, error = %err, "comment page rejected");
                    break degrade(video_id, comments.len(), err)?;
                }
            }
            throttle_retry_used = false;

            if raw.body.trim().is_empty() {
                warn!(video_id, page = pages, "empty response received");
                break StopReason::EmptyBody;
            }
            let page = match ThreadPage::decode(&raw.body) {
                Ok(page) => page,
                Err(err) => {
                    error!(video_id, page = pages, error = %err, "failed to parse comment page");
                    let err = FetchError::Transient(format!("invalid response body: {err}"));
                    break degrade(video_id, comments.len(), err)?;
                }
            };

            let next_token = page.next_page_token().map(str::to_string);
            let received = page.items.len();
            let before = comments.len();
            for item in page.items {
                if comments.len() >= request.early_stop_count {
                    break;
                }
                match decode_comment(item) {
                    Ok(comment) if request.window.contains(comment.published_at) => {
                        comments.push(comment);
                    }
                    Ok(_) => {}
                    Err(err) => {
                        skipped += 1;
                        warn!(video_id, page = pages, error = %err, "skipping malformed comment");
                    }
                }
            }
            info!(
                video_id,
                page = pages,
                received,
                kept = comments.len() - before,
                collected = comments.len(),
                "comment page processed"
            );

            if comments.len() >= request.early_stop_count {
                info!(video_id, early_stop_count = request.early_stop_count, "reached early stop count");
                break StopReason::EarlyStop;
            }
            let Some(token) = next_token else {
                break StopReason::Exhausted;
            };
            page_token = Some(token);

            let delay = self.pacing.delay_after(pages);
            debug!(video_id, page = pages, delay_ms = delay.as_millis() as u64, "pacing before next page");
            sleep(delay).await;
        };

        info!(
            video_id,
            total = comments.len(),
            pages,
            skipped,
            stop = stop.label(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "completed comment fetch"
        );
        Ok(comments)
    }
}

fn classify(raw: &RawPage, video_id: &str) -> PageStatus {
    if raw.is_success() {
        return PageStatus::Ready;
    }
    if raw.is_throttled() {
        return PageStatus::Throttled;
    }
    let upstream = UpstreamError::decode(&raw.body);
    if raw.status == 403
        && (upstream.has_reason("quotaExceeded") || upstream.has_reason("dailyLimitExceeded"))
    {
        return PageStatus::Failed(FetchError::QuotaExceeded);
    }
    if raw.status == 404 || (raw.status == 403 && upstream.has_reason("commentsDisabled")) {
        return PageStatus::Failed(FetchError::ResourceUnavailable {
            video_id: video_id.to_string(),
        });
    }
    let detail = upstream.message.unwrap_or_default();
    PageStatus::Failed(FetchError::Transient(format!(
        "upstream returned status {}: {detail}",
        raw.status
    )))
}

fn degrade(video_id: &str, collected: usize, err: FetchError) -> Result<StopReason, FetchError> {
    if collected == 0 {
        return Err(err);
    }
    warn!(video_id, collected, error = %err, "returning comments collected before error");
    Ok(StopReason::Degraded)
}
