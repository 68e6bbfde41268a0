//! Core types for WattPrint

use serde::{Deserialize, Serialize};

use crate::daypart::{PartOfDay, Season};

/// A batch of conversations to estimate, keyed by conversation id.
///
/// `BTreeMap` keeps response ordering stable across runs.
pub type ConversationBatch = std::collections::BTreeMap<String, ConversationRecord>;

/// One conversation submitted for estimation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// IP of the server that handled the conversation
    pub server_ip: String,

    /// Ordered list of queries in the conversation
    pub queries: Vec<QueryRecord>,

    /// Model that served the conversation, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// A single query within a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRecord {
    /// The query text
    pub query: String,

    /// Per-query model override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Observed inference duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Resolved geographic context for a server IP.
///
/// Immutable once fetched; cached for the resolver TTL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoContext {
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

impl GeoContext {
    /// Degraded context returned when geolocation retries exhaust.
    ///
    /// Downstream this yields the UTC local clock and the equatorial
    /// carbon-intensity band.
    pub fn unresolved() -> Self {
        Self {
            country: "Unknown".to_string(),
            city: "Unknown".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            timezone: "UTC".to_string(),
        }
    }

    /// "Country - City" label used in reports
    pub fn region(&self) -> String {
        format!("{} - {}", self.country, self.city)
    }
}

/// Local time at the datacenter, resolved from its timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeContext {
    /// Month, 1-12
    pub month: u32,
    /// Day of month, 1-31
    pub day: u32,
    /// Hour, 0-23
    pub hour: u32,
    /// True when derived from the local clock rather than the time service
    #[serde(default)]
    pub local_source: bool,
}

/// Where a grid emission estimate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridSource {
    /// Live reading from the carbon intensity service
    Live,
    /// Deterministic latitude-band fallback
    LatitudeBand,
    /// Global average default
    GlobalDefault,
}

/// Grid carbon intensity estimate in gCO2e/kWh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridEstimate {
    pub gco2_per_kwh: f64,
    pub source: GridSource,
}

/// Final sustainability metrics, each rounded to 4 decimal digits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SustainabilityMetrics {
    /// Energy consumption in kWh
    #[serde(rename = "EnergyConsumption")]
    pub energy_kwh: f64,

    /// Carbon emission in kgCO2e
    #[serde(rename = "CarbonEmission")]
    pub carbon_kg: f64,

    /// Water consumption in liters
    #[serde(rename = "WaterConsumption")]
    pub water_l: f64,
}

/// Per-conversation pipeline output: metrics plus the derived context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationReport {
    #[serde(flatten)]
    pub metrics: SustainabilityMetrics,

    /// "Country - City" of the resolved datacenter location
    pub region: String,

    pub datacenter_season: Season,

    #[serde(rename = "datacenter_partOfDay")]
    pub datacenter_part_of_day: PartOfDay,

    pub lat: f64,
    pub lon: f64,

    /// Conversation-level effective model
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_serialize_with_original_field_names() {
        let metrics = SustainabilityMetrics {
            energy_kwh: 0.5982,
            carbon_kg: 0.2393,
            water_l: 1.0767,
        };
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["EnergyConsumption"], 0.5982);
        assert_eq!(json["CarbonEmission"], 0.2393);
        assert_eq!(json["WaterConsumption"], 1.0767);
    }

    #[test]
    fn conversation_record_accepts_minimal_payload() {
        let record: ConversationRecord = serde_json::from_str(
            r#"{"server_ip": "8.8.8.8", "queries": [{"query": "hello"}]}"#,
        )
        .unwrap();
        assert_eq!(record.server_ip, "8.8.8.8");
        assert_eq!(record.queries.len(), 1);
        assert!(record.queries[0].model.is_none());
        assert!(record.queries[0].duration.is_none());
        assert!(record.model.is_none());
    }

    #[test]
    fn unresolved_geo_context_is_utc_origin() {
        let geo = GeoContext::unresolved();
        assert_eq!(geo.timezone, "UTC");
        assert_eq!(geo.latitude, 0.0);
        assert_eq!(geo.region(), "Unknown - Unknown");
    }
}
