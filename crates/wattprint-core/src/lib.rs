//! WattPrint Core
//!
//! Shared types and pure computation for the WattPrint estimation pipeline.
//!
//! This crate provides:
//! - Conversation/query records and resolved context types
//! - Error types and result handling
//! - The static model/category energy factor table
//! - Season and part-of-day derivation for datacenter local time
//! - The adaptive duration baseline and its scaling clamp
//! - The sustainability metrics calculator

pub mod baseline;
pub mod calc;
pub mod daypart;
pub mod energy;
pub mod error;
pub mod types;

pub use baseline::DurationBaseline;
pub use calc::{compute_metrics, pue, round4, QueryTally};
pub use daypart::{PartOfDay, Season};
pub use energy::{EnergyFactorTable, DEFAULT_MODEL};
pub use error::{Error, Result};
pub use types::{
    ConversationBatch, ConversationRecord, ConversationReport, GeoContext, GridEstimate,
    GridSource, QueryRecord, SustainabilityMetrics, TimeContext,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::baseline::DurationBaseline;
    pub use crate::calc::{compute_metrics, QueryTally};
    pub use crate::daypart::{PartOfDay, Season};
    pub use crate::energy::EnergyFactorTable;
    pub use crate::error::{Error, Result};
    pub use crate::types::{
        ConversationBatch, ConversationRecord, ConversationReport, GeoContext, GridEstimate,
        QueryRecord, SustainabilityMetrics, TimeContext,
    };
}
