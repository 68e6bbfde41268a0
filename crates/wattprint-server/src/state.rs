//! Application state wiring

use anyhow::Result;
use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::{info, warn};

use wattprint_pipeline::Pipeline;
use wattprint_resolvers::{
    CarbonResolver, Clock, ElectricityMapsProvider, GeoResolver, HttpIssuer, IpApiProvider,
    QueryClassifier, RemoteBatchClassifier, StaticIssuer, SystemClock, TimeApiProvider,
    TimeResolver, TokenCache, FALLBACK_CATEGORY,
};
use wattprint_telemetry::{JsonlSink, MetricsSink, NullSink};

use crate::config::ServerConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// The estimation pipeline
    pub pipeline: Arc<Pipeline>,

    /// Persistence sink for computed metrics
    pub sink: Arc<dyn MetricsSink>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Initialize application state from configuration
    pub fn new(config: &ServerConfig, metrics_handle: PrometheusHandle) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let geo = GeoResolver::new(
            Arc::new(IpApiProvider::new(
                client.clone(),
                config.upstreams.geo_base_url.clone(),
            )),
            clock.clone(),
        );
        let time = TimeResolver::new(
            Arc::new(TimeApiProvider::new(
                client.clone(),
                config.upstreams.time_base_url.clone(),
            )),
            clock.clone(),
        );
        let carbon = CarbonResolver::new(
            Arc::new(ElectricityMapsProvider::new(
                client.clone(),
                config.upstreams.carbon_base_url.clone(),
                config.upstreams.carbon_api_token.clone(),
            )),
            clock.clone(),
        );

        let classifier = build_classifier(config, &client, &clock)?;
        let pipeline = Arc::new(Pipeline::new(classifier, geo, time, carbon));

        let sink: Arc<dyn MetricsSink> = if config.sink.enabled {
            info!(path = %config.sink.path.display(), "JSON-lines metrics sink enabled");
            Arc::new(JsonlSink::create(
                &config.sink.path,
                config.sink.flush_interval,
            )?)
        } else {
            info!("metrics sink disabled");
            Arc::new(NullSink)
        };

        Ok(Self {
            pipeline,
            sink,
            metrics_handle,
        })
    }

    /// Assemble state from pre-built parts (used by tests)
    pub fn from_parts(
        pipeline: Arc<Pipeline>,
        sink: Arc<dyn MetricsSink>,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        Self {
            pipeline,
            sink,
            metrics_handle,
        }
    }
}

fn build_classifier(
    config: &ServerConfig,
    client: &reqwest::Client,
    clock: &Arc<dyn Clock>,
) -> Result<Arc<dyn QueryClassifier>> {
    let Some(endpoint) = &config.classifier.endpoint else {
        warn!("no classifier endpoint configured; all queries get the fallback category");
        return Ok(Arc::new(UnconfiguredClassifier));
    };

    let issuer: Arc<dyn wattprint_resolvers::CredentialIssuer> =
        if let Some(token) = &config.classifier.static_token {
            Arc::new(StaticIssuer::new(token.clone()))
        } else if let Some(token_url) = &config.classifier.token_url {
            Arc::new(HttpIssuer::new(client.clone(), token_url.clone()))
        } else {
            anyhow::bail!("classifier.endpoint requires classifier.static_token or classifier.token_url");
        };

    let tokens = TokenCache::new(issuer, clock.clone());
    info!(endpoint = %endpoint, "remote batch classifier configured");
    Ok(Arc::new(RemoteBatchClassifier::new(
        client.clone(),
        endpoint.clone(),
        tokens,
    )))
}

/// Stand-in classifier when no endpoint is configured
struct UnconfiguredClassifier;

#[async_trait]
impl QueryClassifier for UnconfiguredClassifier {
    async fn classify_batch(&self, queries: &[String]) -> Vec<String> {
        vec![FALLBACK_CATEGORY.to_string(); queries.len()]
    }
}
