use chrono::{DateTime, Utc};
use clap::Parser;

use pulse_core::error::CoreError;
use pulse_core::types::time_window::TimeWindow;

/// Fetch top-level YouTube comments and print them as JSON.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Video ids or YouTube URLs.
    #[arg(required = true)]
    pub videos: Vec<String>,
    /// Publish-time window, `START~END`; either side may be empty.
    #[arg(long, conflicts_with = "days_back")]
    pub window: Option<String>,
    /// Only keep comments published in the last N days.
    #[arg(long)]
    pub days_back: Option<u32>,
    #[arg(long)]
    pub page_size: Option<u32>,
    #[arg(long)]
    pub max_pages: Option<usize>,
    /// Stop once this many comments were collected per video.
    #[arg(long)]
    pub max_comments: Option<usize>,
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

impl Cli {
    pub fn time_window(&self, now: DateTime<Utc>) -> Result<TimeWindow, CoreError> {
        match (&self.window, self.days_back) {
            (Some(raw), _) => TimeWindow::parse(raw),
            (None, Some(days)) => TimeWindow::last_days(days, now),
            (None, None) => Ok(TimeWindow::unbounded()),
        }
    }
}
