//! Persistence sink for computed metrics
//!
//! The pipeline's output side is a write contract only: one record per
//! conversation, `(conversation_id, energy, water, carbon)`. The bundled
//! implementation appends JSON lines; anything heavier (a relational
//! store, a queue) can stand behind the same trait.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;
use wattprint_core::Result;

/// One persisted estimation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkRecord {
    pub conversation_id: String,
    /// kWh
    pub energy: f64,
    /// Liters
    pub water: f64,
    /// kgCO2e
    pub carbon: f64,
}

/// Write contract for estimation results
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn store(&self, record: &SinkRecord) -> Result<()>;
}

/// Discards every record; used when persistence is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl MetricsSink for NullSink {
    async fn store(&self, _record: &SinkRecord) -> Result<()> {
        Ok(())
    }
}

/// Append-only JSON-lines sink
pub struct JsonlSink {
    inner: Mutex<SinkInner>,
    flush_interval: usize,
}

struct SinkInner {
    writer: BufWriter<File>,
    records_since_flush: usize,
}

impl JsonlSink {
    /// Open (or create) the sink file for appending.
    ///
    /// `flush_interval` is the number of records buffered between flushes;
    /// 1 flushes every record.
    pub fn create(path: impl AsRef<Path>, flush_interval: usize) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            inner: Mutex::new(SinkInner {
                writer: BufWriter::new(file),
                records_since_flush: 0,
            }),
            flush_interval: flush_interval.max(1),
        })
    }
}

#[async_trait]
impl MetricsSink for JsonlSink {
    async fn store(&self, record: &SinkRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let mut inner = self.inner.lock();
        inner.writer.write_all(line.as_bytes())?;
        inner.writer.write_all(b"\n")?;
        inner.records_since_flush += 1;
        if inner.records_since_flush >= self.flush_interval {
            inner.writer.flush()?;
            inner.records_since_flush = 0;
            debug!(conversation = %record.conversation_id, "sink flushed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> SinkRecord {
        SinkRecord {
            conversation_id: id.to_string(),
            energy: 0.5982,
            water: 1.0767,
            carbon: 0.2393,
        }
    }

    #[tokio::test]
    async fn writes_one_parseable_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");
        let sink = JsonlSink::create(&path, 1).unwrap();

        sink.store(&record("conv-1")).await.unwrap();
        sink.store(&record("conv-2")).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: SinkRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, record("conv-1"));
    }

    #[tokio::test]
    async fn appends_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");

        {
            let sink = JsonlSink::create(&path, 1).unwrap();
            sink.store(&record("conv-1")).await.unwrap();
        }
        {
            let sink = JsonlSink::create(&path, 1).unwrap();
            sink.store(&record("conv-2")).await.unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/metrics.jsonl");
        let sink = JsonlSink::create(&path, 1).unwrap();
        sink.store(&record("conv-1")).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn null_sink_accepts_everything() {
        NullSink.store(&record("conv-1")).await.unwrap();
    }
}
