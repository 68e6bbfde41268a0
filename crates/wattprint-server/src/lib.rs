//! WattPrint Server
//!
//! HTTP surface for the estimation pipeline: a batch estimate endpoint,
//! health and Prometheus metrics routes, YAML configuration with CLI
//! overrides, and the wiring of production providers into the pipeline.

pub mod config;
pub mod routes;
pub mod state;

pub use config::{Cli, ServerConfig};
pub use routes::create_router;
pub use state::AppState;
