use reqwest::Client;
use thiserror::Error;

use crate::config::AppConfig;
use pulse_infra::youtube::{CommentFetcher, YoutubeHttpTransport};

const USER_AGENT: &str = concat!("comment-pulse/", env!("CARGO_PKG_VERSION"));

pub type Fetcher = CommentFetcher<YoutubeHttpTransport>;

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Builds the process-wide fetcher. Its client owns the connection pool that
/// every fetch shares.
pub fn build_fetcher(config: &AppConfig) -> Result<Fetcher, WiringError> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .build()?;
    let transport = YoutubeHttpTransport::new(
        client,
        config.api_base_url.clone(),
        config.youtube_api_key.clone(),
        config.request_timeout,
        config.retry,
    );
    Ok(CommentFetcher::new(transport, config.pacing))
}
