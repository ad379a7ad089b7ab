use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use pulse_infra::youtube::fetcher::{
    DEFAULT_EARLY_STOP_COUNT, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use pulse_infra::youtube::transport::DEFAULT_BASE_URL;
use pulse_infra::youtube::{PagePacing, RetryPolicy};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub youtube_api_key: String,
    pub api_base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub pacing: PagePacing,
    pub page_size: u32,
    pub max_pages: usize,
    pub early_stop_count: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),
    #[error("invalid integer for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let youtube_api_key = read_optional_string("COMMENT_PULSE_YOUTUBE_API_KEY")
            .ok_or(ConfigError::Missing("COMMENT_PULSE_YOUTUBE_API_KEY"))?;
        let api_base_url = read_string("COMMENT_PULSE_API_BASE_URL", DEFAULT_BASE_URL);
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "COMMENT_PULSE_API_BASE_URL",
                api_base_url,
            ));
        }
        let connect_timeout_secs = read_u64("COMMENT_PULSE_CONNECT_TIMEOUT_SECS", 5)?;
        let request_timeout_secs = read_u64("COMMENT_PULSE_REQUEST_TIMEOUT_SECS", 30)?;
        let max_retries = read_u64("COMMENT_PULSE_MAX_RETRIES", 3)?;
        let max_retries = u32::try_from(max_retries).map_err(|_| {
            ConfigError::InvalidNumber("COMMENT_PULSE_MAX_RETRIES", max_retries.to_string())
        })?;
        let retry_backoff_ms = read_u64("COMMENT_PULSE_RETRY_BACKOFF_MS", 1000)?;
        let page_size = read_u64("COMMENT_PULSE_PAGE_SIZE", u64::from(DEFAULT_PAGE_SIZE))?;
        let max_pages = read_usize("COMMENT_PULSE_MAX_PAGES", DEFAULT_MAX_PAGES)?;
        let early_stop_count = read_usize("COMMENT_PULSE_EARLY_STOP_COUNT", DEFAULT_EARLY_STOP_COUNT)?;
        let rate_limit_fallback_secs = read_u64("COMMENT_PULSE_RATE_LIMIT_FALLBACK_SECS", 5)?;
        let page_delay_ms = read_u64("COMMENT_PULSE_PAGE_DELAY_MS", 300)?;
        let slow_page_delay_ms = read_u64("COMMENT_PULSE_SLOW_PAGE_DELAY_MS", 500)?;
        let fast_pages = read_usize("COMMENT_PULSE_FAST_PAGES", 3)?;

        Ok(Self {
            youtube_api_key,
            api_base_url,
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
            retry: RetryPolicy {
                max_retries,
                base_backoff: Duration::from_millis(retry_backoff_ms),
            },
            pacing: PagePacing {
                fast_pages,
                fast_delay: Duration::from_millis(page_delay_ms),
                slow_delay: Duration::from_millis(slow_page_delay_ms),
                rate_limit_fallback: Duration::from_secs(rate_limit_fallback_secs),
            },
            page_size: page_size.clamp(1, u64::from(MAX_PAGE_SIZE)) as u32,
            max_pages,
            early_stop_count,
        })
    }
}

/// Seeds the environment from `./.env`; variables already set are kept.
pub fn load_dotenv() -> Result<(), std::io::Error> {
    let path = Path::new(".env");
    if !path.exists() {
        return Ok(());
    }
    let contents = std::fs::read_to_string(path)?;
    for (key, value) in contents.lines().filter_map(parse_dotenv_line) {
        if std::env::var_os(&key).is_some() {
            continue;
        }
        // Safety: called from main before the runtime spawns any task.
        unsafe {
            std::env::set_var(key, value);
        }
    }
    Ok(())
}

fn read_string(key: &'static str, default: &'static str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn read_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    parse_number(key, std::env::var(key).ok(), default)
}

fn read_usize(key: &'static str, default: usize) -> Result<usize, ConfigError> {
    parse_number(key, std::env::var(key).ok(), default)
}

fn parse_number<N>(key: &'static str, raw: Option<String>, default: N) -> Result<N, ConfigError>
where
    N: std::str::FromStr,
{
    match raw {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(key, raw)),
        _ => Ok(default),
    }
}

fn read_optional_string(key: &'static str) -> Option<String> {
    let value = std::env::var(key).unwrap_or_default();
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_dotenv_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, raw_value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), dotenv_value(raw_value.trim())))
}

fn dotenv_value(raw: &str) -> String {
    if let Some(inner) = raw.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')) {
        return inner.to_string();
    }
    let Some(inner) = raw.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) else {
        return raw.to_string();
    };
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some(escaped @ ('\\' | '"')) => value.push(escaped),
            Some(other) => {
                value.push('\\');
                value.push(other);
            }
            None => value.push('\\'),
        }
    }
    value
}
