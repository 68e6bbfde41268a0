//! Generic retry-with-backoff policy shared by all resolvers

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use wattprint_core::{Error, Result};

/// Bounded retry policy: fixed attempt count, exponential backoff between
/// attempts, per-attempt timeout.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after each failure
    pub initial_delay: Duration,
    /// Timeout applied to every individual attempt
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            attempt_timeout,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(5))
    }
}

/// Run `attempt` under `policy`, returning the first success or the last
/// error once attempts exhaust. Callers supply the fallback; this layer
/// only bounds the upstream work.
pub async fn run_with_retries<T, F, Fut>(
    policy: &RetryPolicy,
    label: &'static str,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = policy.initial_delay;
    let mut last_error = Error::upstream(format!("{label}: no attempts made"));

    for attempt_no in 1..=policy.max_attempts {
        if attempt_no > 1 {
            debug!(
                label,
                attempt = attempt_no,
                delay_ms = delay.as_millis() as u64,
                "backing off before retry"
            );
            tokio::time::sleep(delay).await;
            delay *= 2;
        }

        match tokio::time::timeout(policy.attempt_timeout, attempt()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => {
                warn!(label, attempt = attempt_no, error = %err, "attempt failed");
                last_error = err;
            }
            Err(_) => {
                warn!(label, attempt = attempt_no, "attempt timed out");
                last_error = Error::Timeout;
            }
        }
    }

    Err(last_error)
}
