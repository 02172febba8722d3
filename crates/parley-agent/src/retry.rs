use crate::config::AgentConfig;
use reqwest::StatusCode;
use std::time::Duration;

/// Upper bound for a single backoff delay.
const BACKOFF_MAX_MS: u64 = 30_000;

/// How many times a call is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included.
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub backoff_base_ms: u64,
    /// Maximum delay in milliseconds (cap for exponential backoff).
    pub backoff_max_ms: u64,
}

impl RetryPolicy {
    /// Builds the policy from `max_attempts` and `retry_backoff_ms`.
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base_ms: config.retry_backoff_ms,
            backoff_max_ms: BACKOFF_MAX_MS,
        }
    }

    /// Delay before the attempt following failed attempt number `attempt`
    /// (1-based): base, 2 x base, 4 x base, ... capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let delay = self
            .backoff_base_ms
            .saturating_mul(2u64.saturating_pow(exponent));
        Duration::from_millis(delay.min(self.backoff_max_ms))
    }

    /// Whether another attempt is allowed after `attempt` failed.
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Rate limiting (429) and server errors (5xx) are worth another try;
/// other client errors are not.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Connection failures and timeouts are transient; anything else a
/// transport error reports (bad URL, undecodable body, ...) is not.
pub fn is_retryable_transport(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}
