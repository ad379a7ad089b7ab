use std::fmt;

use url::Url;

use crate::error::CoreError;

const VIDEO_ID_LEN: usize = 11;
const SHORT_HOST: &str = "youtu.be";
const YOUTUBE_HOSTS: [&str; 4] = [
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
];
const PATH_PREFIXES: [&str; 4] = ["shorts", "embed", "live", "v"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accepts a bare id or any of the common YouTube URL shapes.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        match id_from_url(trimmed) {
            Some(candidate) => Self::try_from(candidate.as_str())
                .map_err(|_| CoreError::InvalidVideoId(trimmed.to_string())),
            None => Self::try_from(trimmed),
        }
    }
}

impl TryFrom<&str> for VideoId {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidVideoId("empty video id".to_string()));
        }
        if trimmed.len() != VIDEO_ID_LEN
            || !trimmed
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        {
            return Err(CoreError::InvalidVideoId(trimmed.to_string()));
        }
        Ok(VideoId(trimmed.to_string()))
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn id_from_url(input: &str) -> Option<String> {
    let url = if input.contains("://") {
        Url::parse(input).ok()?
    } else if input.contains("youtu") && input.contains('/') {
        Url::parse(&format!("https://{input}")).ok()?
    } else {
        return None;
    };
    let host = url.host_str()?.to_ascii_lowercase();
    let mut segments = url.path_segments()?.filter(|segment| !segment.is_empty());
    if host == SHORT_HOST {
        return segments.next().map(str::to_string);
    }
    if !YOUTUBE_HOSTS.contains(&host.as_str()) {
        return None;
    }
    match segments.next()? {
        "watch" => url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
        prefix if PATH_PREFIXES.contains(&prefix) => {
            segments.next().map(str::to_string)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::VideoId;

    #[test]
    fn accepts_bare_id() {
        let id = VideoId::parse(" dQw4w9WgXcQ ").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(VideoId::parse("short").is_err());
        assert!(VideoId::parse("dQw4w9WgXcQx").is_err());
    }

    #[test]
    fn rejects_invalid_chars() {
        assert!(VideoId::parse("dQw4w9WgX.Q").is_err());
        assert!(VideoId::parse("").is_err());
    }

    #[test]
    fn extracts_from_watch_url() {
        let id = VideoId::parse("https://www.youtube.com/watch?list=PL1&v=dQw4w9WgXcQ&t=4").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn extracts_from_short_links() {
        for url in [
            "https://youtu.be/dQw4w9WgXcQ?t=30",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://m.youtube.com/embed/dQw4w9WgXcQ",
            "youtube.com/live/dQw4w9WgXcQ?feature=share",
        ] {
            let id = VideoId::parse(url).unwrap();
            assert_eq!(id.as_str(), "dQw4w9WgXcQ", "url: {url}");
        }
    }

    #[test]
    fn decodes_percent_encoded_query() {
        let id = VideoId::parse("https://www.youtube.com/watch?v=dQw4w9WgX%2DQ").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgX-Q");
    }

    #[test]
    fn rejects_lookalike_hosts() {
        assert!(VideoId::parse("https://notyoutube.com/watch?v=dQw4w9WgXcQ").is_err());
        assert!(VideoId::parse("https://youtube.com.evil.test/watch?v=dQw4w9WgXcQ").is_err());
        assert!(VideoId::parse("https://notyoutu.be/dQw4w9WgXcQ").is_err());
    }

    #[test]
    fn rejects_foreign_hosts() {
        assert!(VideoId::parse("https://example.com/watch?v=dQw4w9WgXcQ").is_err());
        assert!(VideoId::parse("https://www.youtube.com/playlist?list=PL1").is_err());
    }
}
