//! Time-context resolver
//!
//! Resolves a timezone string to the datacenter's local month/day/hour
//! through a timeapi.io-style endpoint, cached for the shared TTL. When
//! retries exhaust, the server's own clock stands in, flagged with
//! `local_source`.

use async_trait::async_trait;
use chrono::{Datelike, Local, Timelike};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use wattprint_core::{Error, Result, TimeContext};

use crate::cache::{Clock, TtlCache, DEFAULT_TTL};
use crate::retry::{run_with_retries, RetryPolicy};

/// Upstream timezone-to-local-time lookup
#[async_trait]
pub trait TimeProvider: Send + Sync {
    async fn fetch(&self, timezone: &str) -> Result<TimeContext>;
}

/// timeapi.io-style JSON provider
pub struct TimeApiProvider {
    client: reqwest::Client,
    base_url: String,
}

impl TimeApiProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TimeApiResponse {
    month: u32,
    day: u32,
    hour: u32,
}

#[async_trait]
impl TimeProvider for TimeApiProvider {
    async fn fetch(&self, timezone: &str) -> Result<TimeContext> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("timeZone", timezone)])
            .send()
            .await
            .map_err(|e| Error::upstream(format!("time request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::upstream(format!(
                "time lookup for {timezone} returned HTTP {}",
                response.status()
            )));
        }

        let body: TimeApiResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("time response malformed: {e}")))?;

        Ok(TimeContext {
            month: body.month,
            day: body.day,
            hour: body.hour,
            local_source: false,
        })
    }
}

/// Cached, retried timezone-to-time resolver with a local-clock fallback
pub struct TimeResolver {
    provider: Arc<dyn TimeProvider>,
    cache: TtlCache<String, TimeContext>,
    policy: RetryPolicy,
}

impl TimeResolver {
    pub fn new(provider: Arc<dyn TimeProvider>, clock: Arc<dyn Clock>) -> Self {
        Self::with_policy(provider, clock, Self::default_policy())
    }

    pub fn with_policy(
        provider: Arc<dyn TimeProvider>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            cache: TtlCache::new(DEFAULT_TTL, clock),
            policy,
        }
    }

    /// Two attempts, 5 s backoff seed, 10 s per-attempt timeout
    pub fn default_policy() -> RetryPolicy {
        RetryPolicy::new(2, Duration::from_secs(5), Duration::from_secs(10))
    }

    /// Resolve the local time for a timezone, never failing.
    ///
    /// The local-clock fallback is not cached; a later lookup should try
    /// the upstream again.
    pub async fn resolve(&self, timezone: &str) -> TimeContext {
        let key = timezone.to_string();

        if let Some(hit) = self.cache.get(&key) {
            debug!(timezone, "time cache hit");
            return hit;
        }

        match run_with_retries(&self.policy, "time", || self.provider.fetch(timezone)).await {
            Ok(time) => {
                self.cache.insert(key, time);
                time
            }
            Err(err) => {
                warn!(timezone, error = %err, "time retries exhausted, using local clock");
                metrics::counter!("wattprint_resolver_fallback_total", "resolver" => "time")
                    .increment(1);
                local_time_context()
            }
        }
    }

    /// Administrative cache clear
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Current month/day/hour from the server's own clock
pub fn local_time_context() -> TimeContext {
    let now = Local::now();
    TimeContext {
        month: now.month(),
        day: now.day(),
        hour: now.hour(),
        local_source: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_fallback_is_flagged_and_in_range() {
        let time = local_time_context();
        assert!(time.local_source);
        assert!((1..=12).contains(&time.month));
        assert!((1..=31).contains(&time.day));
        assert!(time.hour <= 23);
    }
}
