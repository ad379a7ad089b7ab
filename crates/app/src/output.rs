use serde::Serialize;

use pulse_core::domain::comments::Comment;
use pulse_infra::youtube::FetchError;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum VideoReport<'a> {
    Fetched {
        video_id: &'a str,
        count: usize,
        comments: &'a [Comment],
    },
    Failed {
        video_id: &'a str,
        error: String,
        retryable: bool,
    },
}

impl<'a> VideoReport<'a> {
    pub fn new(video_id: &'a str, result: &'a Result<Vec<Comment>, FetchError>) -> Self {
        match result {
            Ok(comments) => VideoReport::Fetched {
                video_id,
                count: comments.len(),
                comments,
            },
            Err(err) => VideoReport::Failed {
                video_id,
                error: err.to_string(),
                retryable: err.is_retryable(),
            },
        }
    }

    pub fn render(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::Value;

    use super::VideoReport;
    use pulse_core::domain::comments::Comment;
    use pulse_infra::youtube::FetchError;

    #[test]
    fn fetched_report_lists_comments() {
        let published_at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let result = Ok(vec![Comment {
            author: "@viewer".to_string(),
            text: "nice".to_string(),
            published_at,
            updated_at: published_at,
            like_count: 2,
        }]);
        let rendered = VideoReport::new("dQw4w9WgXcQ", &result).render(false).unwrap();
        let value: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["video_id"], "dQw4w9WgXcQ");
        assert_eq!(value["count"], 1);
        assert_eq!(value["comments"][0]["like_count"], 2);
        assert_eq!(value["comments"][0]["published_at"], "2024-01-02T03:04:05Z");
    }

    #[test]
    fn failed_report_flags_retryability() {
        let result = Err(FetchError::ResourceUnavailable {
            video_id: "dQw4w9WgXcQ".to_string(),
        });
        let rendered = VideoReport::new("dQw4w9WgXcQ", &result).render(true).unwrap();
        let value: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["retryable"], false);
        assert!(value["error"].as_str().unwrap().contains("comments are disabled"));
    }
}
