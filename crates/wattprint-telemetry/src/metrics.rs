//! Metric names and descriptions for the WattPrint process

/// Total inbound estimation requests
pub const REQUESTS_TOTAL: &str = "wattprint_requests_total";

/// Conversations processed through the pipeline
pub const CONVERSATIONS_TOTAL: &str = "wattprint_conversations_total";

/// Resolver fallbacks by resolver label
pub const RESOLVER_FALLBACK_TOTAL: &str = "wattprint_resolver_fallback_total";

/// Whole-batch classifier fallbacks
pub const CLASSIFIER_FALLBACK_TOTAL: &str = "wattprint_classifier_fallback_total";

/// Per-conversation pipeline latency
pub const PIPELINE_LATENCY_US: &str = "wattprint_pipeline_latency_us";

/// Register descriptions for every metric the process emits
pub fn describe_metrics() {
    metrics::describe_counter!(REQUESTS_TOTAL, "Total number of estimation requests received");
    metrics::describe_counter!(
        CONVERSATIONS_TOTAL,
        "Total number of conversations processed by the pipeline"
    );
    metrics::describe_counter!(
        RESOLVER_FALLBACK_TOTAL,
        "Resolver lookups that exhausted retries and degraded to a fallback, by resolver"
    );
    metrics::describe_counter!(
        CLASSIFIER_FALLBACK_TOTAL,
        "Classification batches that fell back to the default category"
    );
    metrics::describe_histogram!(
        PIPELINE_LATENCY_US,
        metrics::Unit::Microseconds,
        "Pipeline execution latency per conversation in microseconds"
    );
}
