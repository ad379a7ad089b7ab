mod cli;
mod config;
mod output;
mod wiring;

use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::ConfigError;
use crate::output::VideoReport;
use crate::wiring::WiringError;
use pulse_core::error::CoreError;
use pulse_core::types::video_id::VideoId;
use pulse_infra::youtube::FetchRequest;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid input: {0}")]
    Input(#[from] CoreError),
    #[error("wiring error: {0}")]
    Wiring(#[from] WiringError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("{0} video(s) failed")]
    FetchFailed(usize),
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    config::load_dotenv()?;
    let config = config::AppConfig::from_env()?;
    let window = cli.time_window(Utc::now())?;
    let videos = cli
        .videos
        .iter()
        .map(|raw| VideoId::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let fetcher = Arc::new(wiring::build_fetcher(&config)?);
    let page_size = cli.page_size.unwrap_or(config.page_size);
    let max_pages = cli.max_pages.unwrap_or(config.max_pages);
    let early_stop_count = cli.max_comments.unwrap_or(config.early_stop_count);
    info!(
        videos = videos.len(),
        page_size,
        max_pages,
        early_stop_count,
        "fetching comments"
    );

    let mut tasks = JoinSet::new();
    for (position, video_id) in videos.into_iter().enumerate() {
        let request = FetchRequest::new(video_id)
            .with_window(window)
            .with_page_size(page_size)
            .with_max_pages(max_pages)
            .with_early_stop_count(early_stop_count);
        let fetcher = Arc::clone(&fetcher);
        tasks.spawn(async move {
            let result = fetcher.fetch(&request).await;
            (position, request.video_id, result)
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|(position, _, _)| *position);

    let mut stdout = std::io::stdout().lock();
    let mut failures = 0;
    for (_, video_id, result) in &results {
        if let Err(err) = result {
            failures += 1;
            warn!(video_id = %video_id, error = %err, "comment fetch failed");
        }
        let line = VideoReport::new(video_id.as_str(), result).render(cli.pretty)?;
        writeln!(stdout, "{line}")?;
    }
    stdout.flush()?;

    if failures > 0 {
        return Err(AppError::FetchFailed(failures));
    }
    Ok(())
}
