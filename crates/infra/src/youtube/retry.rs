use std::time::Duration;

use rand::Rng;
use reqwest::Method;

const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Connection-level retry budget applied beneath the pagination loop.
///
/// Attempt `n` (zero based) waits `base_backoff * 2^n` plus up to 10% jitter,
/// capped at 30 seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            base_backoff: Duration::ZERO,
        }
    }

    pub fn allows_method(&self, method: &Method) -> bool {
        method.is_idempotent()
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        RETRYABLE_STATUSES.contains(&status)
    }

    pub fn has_budget(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if base.is_zero() {
            return base;
        }
        let jitter_ceiling = (base.as_millis() / 10) as u64;
        let jitter = if jitter_ceiling == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ceiling)
        };
        (base + Duration::from_millis(jitter)).min(MAX_BACKOFF)
    }

    fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::Method;

    use super::RetryPolicy;

    #[test]
    fn retryable_statuses_match_throttle_and_gateway_errors() {
        let policy = RetryPolicy::default();
        for status in [429, 500, 502, 503, 504] {
            assert!(policy.is_retryable_status(status), "status {status}");
        }
        for status in [200, 400, 403, 404, 501] {
            assert!(!policy.is_retryable_status(status), "status {status}");
        }
    }

    #[test]
    fn only_idempotent_methods_are_retried() {
        let policy = RetryPolicy::default();
        assert!(policy.allows_method(&Method::GET));
        assert!(!policy.allows_method(&Method::POST));
    }

    #[test]
    fn backoff_doubles_with_bounded_jitter() {
        let policy = RetryPolicy::default();
        for (attempt, base_ms) in [(0, 1000u64), (1, 2000), (2, 4000)] {
            let delay = policy.backoff(attempt).as_millis() as u64;
            assert!(delay >= base_ms, "attempt {attempt}: {delay}");
            assert!(delay <= base_ms + base_ms / 10, "attempt {attempt}: {delay}");
        }
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(40), Duration::from_secs(30));
    }

    #[test]
    fn budget_is_bounded() {
        let policy = RetryPolicy::default();
        assert!(policy.has_budget(2));
        assert!(!policy.has_budget(3));
        assert!(!RetryPolicy::disabled().has_budget(0));
    }
}
