//! IP geolocation resolver
//!
//! Resolves a server IP to country/city/coordinates/timezone through an
//! ip-api.com-style endpoint, cached for the shared TTL. Exhausted retries
//! degrade to [`GeoContext::unresolved`] rather than failing the caller.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use wattprint_core::{Error, GeoContext, Result};

use crate::cache::{Clock, TtlCache, DEFAULT_TTL};
use crate::retry::{run_with_retries, RetryPolicy};

/// Upstream geolocation lookup
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Fetch the geolocation for a normalized IP key (`"self"` for the
    /// caller's own address)
    async fn fetch(&self, ip: &str) -> Result<GeoContext>;
}

/// ip-api.com-style JSON provider
pub struct IpApiProvider {
    client: reqwest::Client,
    base_url: String,
}

impl IpApiProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
    #[serde(default)]
    timezone: String,
}

#[async_trait]
impl GeoProvider for IpApiProvider {
    async fn fetch(&self, ip: &str) -> Result<GeoContext> {
        let url = if ip == "self" {
            format!("{}/json", self.base_url)
        } else {
            format!("{}/json/{}", self.base_url, ip)
        };

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::upstream(format!("geolocation request failed: {e}")))?;

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("geolocation response malformed: {e}")))?;

        if body.status != "success" {
            return Err(Error::upstream(format!(
                "geolocation lookup for {ip} returned status {:?}",
                body.status
            )));
        }

        Ok(GeoContext {
            country: body.country,
            city: body.city,
            latitude: body.lat,
            longitude: body.lon,
            timezone: body.timezone,
        })
    }
}

/// Cached, retried IP-to-geolocation resolver
pub struct GeoResolver {
    provider: Arc<dyn GeoProvider>,
    cache: TtlCache<String, GeoContext>,
    policy: RetryPolicy,
}

impl GeoResolver {
    pub fn new(provider: Arc<dyn GeoProvider>, clock: Arc<dyn Clock>) -> Self {
        Self::with_policy(provider, clock, Self::default_policy())
    }

    pub fn with_policy(
        provider: Arc<dyn GeoProvider>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            cache: TtlCache::new(DEFAULT_TTL, clock),
            policy,
        }
    }

    /// Three attempts, 1 s backoff seed, 5 s per-attempt timeout
    pub fn default_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(5))
    }

    /// Empty or whitespace IPs resolve the server's own address
    fn cache_key(ip: &str) -> String {
        let trimmed = ip.trim();
        if trimmed.is_empty() {
            "self".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Resolve an IP, never failing: cache hit, fresh fetch, or the
    /// unresolved fallback context.
    pub async fn resolve(&self, ip: &str) -> GeoContext {
        let key = Self::cache_key(ip);

        if let Some(hit) = self.cache.get(&key) {
            debug!(ip = %key, "geolocation cache hit");
            return hit;
        }

        match run_with_retries(&self.policy, "geolocation", || self.provider.fetch(&key)).await {
            Ok(geo) => {
                self.cache.insert(key, geo.clone());
                geo
            }
            Err(err) => {
                warn!(ip = %key, error = %err, "geolocation retries exhausted, using unresolved context");
                metrics::counter!("wattprint_resolver_fallback_total", "resolver" => "geolocation")
                    .increment(1);
                GeoContext::unresolved()
            }
        }
    }

    /// Administrative cache clear
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
