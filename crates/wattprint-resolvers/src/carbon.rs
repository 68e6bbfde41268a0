//! Grid carbon-intensity resolver
//!
//! Resolves rounded coordinates to gCO2e/kWh through an
//! electricitymaps-style endpoint, cached for the shared TTL. Exhausted
//! retries degrade to a deterministic latitude-band estimate.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};
use wattprint_core::{Error, GridEstimate, GridSource, Result};

use crate::cache::{Clock, TtlCache, DEFAULT_TTL};
use crate::retry::{run_with_retries, RetryPolicy};

/// Global average applied when even the latitude band is unusable
pub const GLOBAL_DEFAULT_INTENSITY: f64 = 450.0;

/// Upstream carbon-intensity lookup
#[async_trait]
pub trait CarbonProvider: Send + Sync {
    /// Fetch the live grid intensity (gCO2e/kWh) for coordinates
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<f64>;
}

/// electricitymaps-style JSON provider with an `auth-token` header
pub struct ElectricityMapsProvider {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl ElectricityMapsProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CarbonIntensityResponse {
    #[serde(rename = "carbonIntensity")]
    carbon_intensity: f64,
}

#[async_trait]
impl CarbonProvider for ElectricityMapsProvider {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<f64> {
        let mut request = self
            .client
            .get(&self.base_url)
            .query(&[("lat", latitude), ("lon", longitude)])
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(token) = &self.api_token {
            request = request.header("auth-token", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::upstream(format!("carbon intensity request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::upstream(format!(
                "carbon intensity lookup returned HTTP {}",
                response.status()
            )));
        }

        let body: CarbonIntensityResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("carbon intensity response malformed: {e}")))?;

        if !body.carbon_intensity.is_finite() || body.carbon_intensity <= 0.0 {
            return Err(Error::upstream(format!(
                "carbon intensity out of range: {}",
                body.carbon_intensity
            )));
        }

        Ok(body.carbon_intensity)
    }
}

/// Cached, retried coordinates-to-intensity resolver
pub struct CarbonResolver {
    provider: Arc<dyn CarbonProvider>,
    cache: TtlCache<String, f64>,
    policy: RetryPolicy,
}

impl CarbonResolver {
    pub fn new(provider: Arc<dyn CarbonProvider>, clock: Arc<dyn Clock>) -> Self {
        Self::with_policy(provider, clock, RetryPolicy::default())
    }

    pub fn with_policy(
        provider: Arc<dyn CarbonProvider>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            cache: TtlCache::new(DEFAULT_TTL, clock),
            policy,
        }
    }

    /// Coordinates rounded to 4 decimals, matching cache granularity
    fn cache_key(latitude: f64, longitude: f64) -> String {
        format!("{latitude:.4},{longitude:.4}")
    }

    /// Resolve the grid intensity for coordinates, never failing.
    ///
    /// Non-finite coordinates skip the upstream entirely. Fallback
    /// estimates are not cached.
    pub async fn resolve(&self, latitude: f64, longitude: f64) -> GridEstimate {
        if !latitude.is_finite() || !longitude.is_finite() {
            warn!(latitude, longitude, "non-finite coordinates, using fallback intensity");
            return fallback_estimate(latitude);
        }

        let key = Self::cache_key(latitude, longitude);

        if let Some(hit) = self.cache.get(&key) {
            debug!(%key, "carbon intensity cache hit");
            return GridEstimate {
                gco2_per_kwh: hit,
                source: GridSource::Live,
            };
        }

        let attempt = || self.provider.fetch(latitude, longitude);
        match run_with_retries(&self.policy, "carbon_intensity", attempt).await {
            Ok(intensity) => {
                self.cache.insert(key, intensity);
                GridEstimate {
                    gco2_per_kwh: intensity,
                    source: GridSource::Live,
                }
            }
            Err(err) => {
                warn!(%key, error = %err, "carbon intensity retries exhausted, using latitude band");
                metrics::counter!("wattprint_resolver_fallback_total", "resolver" => "carbon")
                    .increment(1);
                fallback_estimate(latitude)
            }
        }
    }

    /// Administrative cache clear
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Deterministic latitude-band fallback.
///
/// Bands reflect broad grid-mix tendencies by latitude: high latitudes
/// lean on hydro and nuclear, mid latitudes on mixed fossil grids.
pub fn fallback_intensity(latitude: f64) -> f64 {
    if !latitude.is_finite() {
        return GLOBAL_DEFAULT_INTENSITY;
    }
    match latitude.abs() {
        band if band >= 55.0 => 250.0,
        band if band >= 35.0 => 420.0,
        band if band >= 20.0 => 550.0,
        _ => 480.0,
    }
}

fn fallback_estimate(latitude: f64) -> GridEstimate {
    if latitude.is_finite() {
        GridEstimate {
            gco2_per_kwh: fallback_intensity(latitude),
            source: GridSource::LatitudeBand,
        }
    } else {
        GridEstimate {
            gco2_per_kwh: GLOBAL_DEFAULT_INTENSITY,
            source: GridSource::GlobalDefault,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latitude_bands_are_total_and_positive() {
        for lat in [-89.9, -60.0, -40.0, -25.0, 0.0, 10.0, 30.0, 50.0, 70.0] {
            let intensity = fallback_intensity(lat);
            assert!(intensity.is_finite() && intensity > 0.0, "lat {lat}");
        }
        assert_eq!(fallback_intensity(60.0), 250.0);
        assert_eq!(fallback_intensity(-45.0), 420.0);
        assert_eq!(fallback_intensity(25.0), 550.0);
        assert_eq!(fallback_intensity(5.0), 480.0);
        assert_eq!(fallback_intensity(f64::NAN), GLOBAL_DEFAULT_INTENSITY);
    }

    #[test]
    fn cache_key_rounds_to_four_decimals() {
        assert_eq!(
            CarbonResolver::cache_key(52.520008, 13.404954),
            "52.5200,13.4050"
        );
    }
}
