// Retry policy for the request executor.
//
// Deterministic capped exponential backoff: base, 2*base, 4*base, ...
// never exceeding `max_delay`. No jitter, so attempt timing is reproducible.

use std::time::Duration;

use reqwest::StatusCode;

/// Statuses that are retried before giving up.
const RETRYABLE_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// How many times, and how patiently, a failed request is re-issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one. `0` disables retries.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Total attempts a permanently failing request will consume.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1_u32 << exponent)
            .min(self.max_delay)
    }

    /// Whether a response with this status is worth re-issuing.
    pub fn is_retryable_status(status: StatusCode) -> bool {
        RETRYABLE_STATUSES.contains(&status)
    }

    /// Whether a transport failure happened before the server could
    /// answer (connect, timeout, or request write errors).
    pub fn is_retryable_transport(err: &reqwest::Error) -> bool {
        err.is_connect() || err.is_timeout() || err.is_request()
    }
}
