//! WattPrint Resolvers
//!
//! Cached, retrying lookups for the context the estimation pipeline needs:
//! - IP geolocation (country/city/coordinates/timezone)
//! - Timezone local time (month/day/hour)
//! - Grid carbon intensity (gCO2e/kWh)
//! - Batch query classification with credential caching
//!
//! Every resolver shares the same TTL-cache-plus-bounded-retry shape and
//! absorbs upstream failure into a deterministic degraded estimate;
//! failure never propagates to the pipeline.

pub mod cache;
pub mod carbon;
pub mod classify;
pub mod geo;
pub mod retry;
pub mod time;

pub use cache::{Clock, ManualClock, SystemClock, TtlCache, DEFAULT_TTL};
pub use carbon::{CarbonProvider, CarbonResolver, ElectricityMapsProvider};
pub use classify::{
    CredentialIssuer, HttpIssuer, QueryClassifier, RemoteBatchClassifier, StaticIssuer,
    TokenCache, FALLBACK_CATEGORY,
};
pub use geo::{GeoProvider, GeoResolver, IpApiProvider};
pub use retry::{run_with_retries, RetryPolicy};
pub use time::{local_time_context, TimeApiProvider, TimeProvider, TimeResolver};
