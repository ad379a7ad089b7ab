use chrono::{DateTime, Utc};
use serde::Serialize;

/// A top-level YouTube comment as delivered to the analysis layer.
///
/// `text` is the upstream `textDisplay` value and may contain HTML entities;
/// it is passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub like_count: u64,
}
