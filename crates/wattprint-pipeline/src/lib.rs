//! WattPrint Pipeline
//!
//! Sequences the resolvers per conversation:
//!
//! `Validate -> Dispatch(parallel classify + geolocate) -> DeriveTime ->
//! DeriveSeasonAndPartOfDay -> TallyCategories -> ResolveCarbon ->
//! Compute -> Emit`
//!
//! Validation failure aborts the whole batch before any processing. Every
//! downstream failure is absorbed by its resolver's fallback, so each
//! conversation always reaches the compute step, possibly with degraded
//! inputs.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use wattprint_core::{
    compute_metrics, ConversationBatch, ConversationRecord, ConversationReport, DurationBaseline,
    EnergyFactorTable, Error, PartOfDay, QueryRecord, QueryTally, Result, Season, DEFAULT_MODEL,
};
use wattprint_resolvers::{CarbonResolver, GeoResolver, QueryClassifier, TimeResolver};

/// The per-conversation estimation pipeline.
///
/// Conversations in a batch are processed sequentially; the only mutable
/// state they share is the resolver caches (last write wins) and the
/// duration baseline, whose updates are serialized behind a mutex.
pub struct Pipeline {
    classifier: Arc<dyn QueryClassifier>,
    geo: GeoResolver,
    time: TimeResolver,
    carbon: CarbonResolver,
    baseline: Mutex<DurationBaseline>,
    table: &'static EnergyFactorTable,
}

impl Pipeline {
    pub fn new(
        classifier: Arc<dyn QueryClassifier>,
        geo: GeoResolver,
        time: TimeResolver,
        carbon: CarbonResolver,
    ) -> Self {
        Self::with_baseline(classifier, geo, time, carbon, DurationBaseline::default())
    }

    pub fn with_baseline(
        classifier: Arc<dyn QueryClassifier>,
        geo: GeoResolver,
        time: TimeResolver,
        carbon: CarbonResolver,
        baseline: DurationBaseline,
    ) -> Self {
        Self {
            classifier,
            geo,
            time,
            carbon,
            baseline: Mutex::new(baseline),
            table: EnergyFactorTable::builtin(),
        }
    }

    /// Process a whole batch.
    ///
    /// Every conversation is validated up front; any invalid conversation
    /// fails the entire batch with no partial output.
    pub async fn process_batch(
        &self,
        batch: &ConversationBatch,
    ) -> Result<BTreeMap<String, ConversationReport>> {
        for (id, record) in batch {
            validate(id, record)?;
        }

        let mut reports = BTreeMap::new();
        for (id, record) in batch {
            let started = Instant::now();
            let report = self.process_conversation(id, record).await;
            metrics::histogram!("wattprint_pipeline_latency_us")
                .record(started.elapsed().as_micros() as f64);
            metrics::counter!("wattprint_conversations_total").increment(1);
            reports.insert(id.clone(), report);
        }
        Ok(reports)
    }

    /// Run one validated conversation through the stage sequence
    async fn process_conversation(&self, id: &str, record: &ConversationRecord) -> ConversationReport {
        let queries: Vec<&QueryRecord> = record
            .queries
            .iter()
            .filter(|q| !q.query.trim().is_empty())
            .collect();
        let texts: Vec<String> = queries.iter().map(|q| q.query.clone()).collect();

        // Classification and geolocation have no ordering dependency
        let (labels, geo) = tokio::join!(
            self.classifier.classify_batch(&texts),
            self.geo.resolve(&record.server_ip),
        );

        let time = self.time.resolve(&geo.timezone).await;
        let season = Season::from_date(time.month, time.day, &geo.timezone);
        let part_of_day = PartOfDay::from_hour(time.hour);

        let effective_model = record.model.as_deref().unwrap_or(DEFAULT_MODEL);
        let mut tally = QueryTally::new();
        for (query, label) in queries.iter().zip(&labels) {
            let model = query.model.as_deref().unwrap_or(effective_model);
            tally.record(model, label);
        }
        debug_assert_eq!(tally.total(), queries.len());

        let scaling = self.scaling_for(&queries);
        let grid = self.carbon.resolve(geo.latitude, geo.longitude).await;

        let metrics = compute_metrics(
            self.table,
            &tally,
            season,
            part_of_day,
            Some(grid.gco2_per_kwh),
            scaling,
        );

        info!(
            conversation = id,
            queries = queries.len(),
            region = %geo.region(),
            season = %season,
            part_of_day = %part_of_day,
            grid_source = ?grid.source,
            energy_kwh = metrics.energy_kwh,
            "conversation estimated"
        );

        ConversationReport {
            metrics,
            region: geo.region(),
            datacenter_season: season,
            datacenter_part_of_day: part_of_day,
            lat: geo.latitude,
            lon: geo.longitude,
            model: effective_model.to_string(),
        }
    }

    /// Scaling factor from the batch's mean observed duration.
    ///
    /// Reads the pre-update average, then folds the mean into the
    /// baseline; the lock spans both so concurrent batches cannot lose
    /// updates. Batches without usable durations neither scale nor update.
    fn scaling_for(&self, queries: &[&QueryRecord]) -> Option<f64> {
        let durations: Vec<f64> = queries
            .iter()
            .filter_map(|q| q.duration)
            .filter(|d| d.is_finite() && *d >= 0.0)
            .collect();
        if durations.is_empty() {
            return None;
        }

        let mean = durations.iter().sum::<f64>() / durations.len() as f64;
        let mut baseline = self.baseline.lock();
        let factor = baseline.scaling_factor(mean);
        baseline.update(mean);
        debug!(mean, factor, average = baseline.average(), "duration baseline updated");
        Some(factor)
    }

    /// Current smoothed duration average in seconds
    pub fn baseline_average(&self) -> f64 {
        self.baseline.lock().average()
    }

    /// Administrative clear of every resolver cache
    pub fn clear_caches(&self) {
        self.geo.clear_cache();
        self.time.clear_cache();
        self.carbon.clear_cache();
    }
}

/// Input validation: non-empty server_ip and at least one non-blank query
fn validate(id: &str, record: &ConversationRecord) -> Result<()> {
    if record.server_ip.trim().is_empty() {
        return Err(Error::invalid_input(format!(
            "conversation {id}: server_ip is required"
        )));
    }
    if !record.queries.iter().any(|q| !q.query.trim().is_empty()) {
        return Err(Error::invalid_input(format!(
            "conversation {id}: at least one non-empty query is required"
        )));
    }
    Ok(())
}
