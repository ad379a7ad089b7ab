use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::error::CoreError;

/// Closed window over comment publish times. A missing bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, CoreError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(CoreError::InvalidTimeWindow(format!("{start} > {end}")));
            }
        }
        Ok(TimeWindow { start, end })
    }

    pub fn last_days(days: u32, now: DateTime<Utc>) -> Result<Self, CoreError> {
        let start = Duration::try_days(i64::from(days))
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or_else(|| CoreError::InvalidTimeWindow(format!("{days} days before {now}")))?;
        Ok(TimeWindow {
            start: Some(start),
            end: Some(now),
        })
    }

    /// Parses `START~END`, where either side may be empty and each side is a
    /// `YYYY-MM-DD` date or an RFC 3339 timestamp.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let trimmed = input.trim();
        let Some((left, right)) = trimmed.split_once('~') else {
            return Err(CoreError::InvalidTimeWindow(trimmed.to_string()));
        };
        let start = parse_bound(left.trim(), NaiveTime::MIN)?;
        let end = parse_bound(right.trim(), end_of_day())?;
        if start.is_none() && end.is_none() {
            return Err(CoreError::InvalidTimeWindow(trimmed.to_string()));
        }
        Self::new(start, end).map_err(|_| CoreError::InvalidTimeWindow(trimmed.to_string()))
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if at < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if at > end {
                return false;
            }
        }
        true
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

fn parse_bound(input: &str, date_time: NaiveTime) -> Result<Option<DateTime<Utc>>, CoreError> {
    if input.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(Some(date.and_time(date_time).and_utc()));
    }
    DateTime::parse_from_rfc3339(input)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|_| CoreError::InvalidTimeWindow(input.to_string()))
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parse_start_only_window() {
        let window = TimeWindow::parse("2020-01-01~").unwrap();
        assert_eq!(window.start, Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(window.end, None);
    }

    #[test]
    fn parse_end_only_window_covers_whole_day() {
        let window = TimeWindow::parse("~2020-01-01").unwrap();
        assert_eq!(window.start, None);
        let last_second = Utc.with_ymd_and_hms(2020, 1, 1, 23, 59, 59).unwrap();
        let end = window.end.unwrap();
        assert!(end >= last_second);
        assert!(end < last_second + Duration::seconds(1));
    }

    #[test]
    fn date_end_keeps_fractional_last_second() {
        let window = TimeWindow::parse("~2020-01-01").unwrap();
        let late = DateTime::parse_from_rfc3339("2020-01-01T23:59:59.5Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(window.contains(late));
        assert!(!window.contains(Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap()));
    }

    #[test]
    fn parse_rfc3339_bounds() {
        let window = TimeWindow::parse("2024-03-01T10:00:00Z~2024-03-01T12:30:00+02:00").unwrap();
        assert_eq!(window.start, Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()));
        assert_eq!(window.end, Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap()));
    }

    #[test]
    fn reject_empty_window() {
        assert!(TimeWindow::parse("~").is_err());
        assert!(TimeWindow::parse("2020-01-01").is_err());
    }

    #[test]
    fn reject_inverted_window() {
        assert!(TimeWindow::parse("2021-01-01~2020-01-01").is_err());
    }

    #[test]
    fn contains_is_inclusive_on_both_ends() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let window = TimeWindow::new(Some(start), Some(end)).unwrap();
        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(start - Duration::seconds(1)));
        assert!(!window.contains(end + Duration::seconds(1)));
    }

    #[test]
    fn unbounded_contains_everything() {
        let window = TimeWindow::unbounded();
        assert!(window.is_unbounded());
        assert!(window.contains(Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap()));
    }

    #[test]
    fn last_days_ends_now() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let window = TimeWindow::last_days(7, now).unwrap();
        assert_eq!(window.end, Some(now));
        assert_eq!(window.start, Some(Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap()));
    }

    #[test]
    fn last_days_rejects_out_of_range_span() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let err = TimeWindow::last_days(u32::MAX, now).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTimeWindow(_)));
    }
}
