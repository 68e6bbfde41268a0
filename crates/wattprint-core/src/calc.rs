//! Sustainability metrics calculator
//!
//! Pure functions only: category tallies, the energy factor table, the PUE
//! table, grid intensity, and an optional duration-scaling factor in;
//! rounded energy/carbon/water figures out.

use std::collections::BTreeMap;

use tracing::debug;

use crate::daypart::{PartOfDay, Season};
use crate::energy::EnergyFactorTable;
use crate::types::SustainabilityMetrics;

/// Global average grid intensity in gCO2e/kWh, applied when no live or
/// banded estimate is available
pub const DEFAULT_GRID_INTENSITY: f64 = 450.0;

/// Water drawn per kWh of datacenter energy, in liters.
///
/// Unit convention: per-kWh, multiplied directly against the reported
/// energy figure.
pub const WATER_LITERS_PER_KWH: f64 = 1.8;

/// Per-conversation query tallies, keyed by (model, category).
///
/// Per-query model overrides land under their own model; the common case
/// has a single model key.
#[derive(Debug, Clone, Default)]
pub struct QueryTally {
    counts: BTreeMap<(String, String), usize>,
}

impl QueryTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one query under (model, category)
    pub fn record(&mut self, model: &str, category: &str) {
        *self
            .counts
            .entry((model.to_string(), category.to_string()))
            .or_insert(0) += 1;
    }

    /// Total number of queries tallied
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate (model, category, count)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, usize)> {
        self.counts
            .iter()
            .map(|((model, category), count)| (model.as_str(), category.as_str(), *count))
    }
}

/// Power Usage Effectiveness for a (season, part-of-day) pair.
///
/// Total over all inputs; summer afternoons carry the heaviest cooling
/// overhead.
pub fn pue(season: Season, part_of_day: PartOfDay) -> f64 {
    match (season == Season::Summer, part_of_day == PartOfDay::Afternoon) {
        (true, true) => 1.6,
        (true, false) => 1.2,
        (false, true) => 1.4,
        (false, false) => 1.1,
    }
}

/// Round to 4 decimal digits, the precision of all reported figures
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Compute the sustainability metrics for one conversation.
///
/// A missing (model, category) table entry contributes 0 Wh. Non-finite
/// terms are dropped before accumulation so one malformed factor cannot
/// corrupt the batch total.
pub fn compute_metrics(
    table: &EnergyFactorTable,
    tally: &QueryTally,
    season: Season,
    part_of_day: PartOfDay,
    grid_intensity: Option<f64>,
    scaling_factor: Option<f64>,
) -> SustainabilityMetrics {
    let mut total_wh = 0.0;
    for (model, category, count) in tally.iter() {
        let factor = match table.factor(model, category) {
            Some(factor) => factor,
            None => {
                debug!(model, category, "no energy factor, contributing 0 Wh");
                continue;
            }
        };
        let term = count as f64 * factor;
        if term.is_finite() {
            total_wh += term;
        }
    }

    let grid = grid_intensity
        .filter(|g| g.is_finite() && *g > 0.0)
        .unwrap_or(DEFAULT_GRID_INTENSITY);
    let scaling = scaling_factor.unwrap_or(1.0);

    let actual = sanitize(total_wh * pue(season, part_of_day) * scaling);

    SustainabilityMetrics {
        energy_kwh: round4(actual),
        carbon_kg: round4(sanitize(actual * grid / 1000.0)),
        water_l: round4(sanitize(actual * WATER_LITERS_PER_KWH)),
    }
}

/// Guard against non-finite intermediates
fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
