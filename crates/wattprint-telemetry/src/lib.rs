//! WattPrint Telemetry
//!
//! The persistence write contract for computed metrics, a JSON-lines
//! implementation of it, and the process metric registry.

pub mod metrics;
pub mod sink;

pub use sink::{JsonlSink, MetricsSink, NullSink, SinkRecord};
