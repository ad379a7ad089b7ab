use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use pulse_core::domain::comments::Comment;

/// Per-record decode failure. Logged and skipped by the fetcher.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("malformed comment thread: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// A `commentThreads.list` page. Items stay untyped until each one is
/// validated on its own, so one bad record cannot reject the page.
#[derive(Debug, Deserialize)]
pub struct ThreadPage {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

impl ThreadPage {
    pub fn decode(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    pub fn next_page_token(&self) -> Option<&str> {
        self.next_page_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ThreadItem {
    snippet: ThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    author_display_name: String,
    text_display: String,
    published_at: String,
    updated_at: Option<String>,
    like_count: Option<u64>,
}

pub fn decode_comment(item: Value) -> Result<Comment, ItemError> {
    let item: ThreadItem = serde_json::from_value(item)?;
    let snippet = item.snippet.top_level_comment.snippet;
    let published_at = parse_datetime(&snippet.published_at)?;
    let updated_at = match snippet.updated_at.as_deref() {
        Some(value) => parse_datetime(value)?,
        None => published_at,
    };
    Ok(Comment {
        author: snippet.author_display_name,
        text: snippet.text_display,
        published_at,
        updated_at,
        like_count: snippet.like_count.unwrap_or(0),
    })
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, ItemError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ItemError::InvalidTimestamp(value.to_string()))
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    #[serde(default)]
    reason: Option<String>,
}

/// Error details pulled from a non-2xx body. Bodies that are not the usual
/// Google error envelope still match on raw substrings.
#[derive(Debug, Default)]
pub struct UpstreamError {
    pub reasons: Vec<String>,
    pub message: Option<String>,
    raw: String,
}

impl UpstreamError {
    pub fn decode(body: &str) -> Self {
        let raw = body.to_string();
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => Self {
                reasons: envelope
                    .error
                    .errors
                    .into_iter()
                    .filter_map(|item| item.reason)
                    .collect(),
                message: envelope.error.message,
                raw,
            },
            Err(_) => Self {
                raw,
                ..Self::default()
            },
        }
    }

    pub fn has_reason(&self, reason: &str) -> bool {
        self.reasons.iter().any(|value| value == reason) || self.raw.contains(reason)
    }
}
