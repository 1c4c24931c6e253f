//! Audit sink for automatic method selections.
//!
//! The engine writes one record per AUTO invocation and never reads it back.
//! Implementations must not block meaningfully and must not fail; they are
//! injected by the caller rather than reached through a process-wide
//! singleton, so concurrent per-SKU forecasting stays safe.

use crate::core::SeriesStatistics;
use crate::models::ForecastMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// One automatic method-selection decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRecord {
    pub series_id: Option<String>,
    pub method: ForecastMethod,
    pub confidence: f64,
    pub reason: String,
    /// The features the decision was based on.
    pub characteristics: BTreeMap<String, f64>,
    /// Ranked alternatives with their suitability scores.
    pub alternatives: Vec<(ForecastMethod, f64)>,
    pub data_stats: SeriesStatistics,
    pub success: bool,
    pub error: Option<String>,
}

/// Write-only destination for selection records.
///
/// The contract is narrow on purpose: the call returns a record id, does not
/// block meaningfully and does not fail. Durable storage is the embedder's
/// concern.
pub trait AuditSink: Send + Sync {
    fn log_selection(&self, record: &SelectionRecord) -> u64;
}

/// Sink that discards every record.
#[derive(Debug, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn log_selection(&self, _record: &SelectionRecord) -> u64 {
        0
    }
}

/// Sink that emits each record as a `tracing` event.
#[derive(Debug, Default)]
pub struct TracingAuditSink {
    next_id: AtomicU64,
}

impl TracingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditSink for TracingAuditSink {
    fn log_selection(&self, record: &SelectionRecord) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(
            record_id = id,
            series_id = record.series_id.as_deref().unwrap_or("<unnamed>"),
            method = record.method.canonical_name(),
            confidence = record.confidence,
            success = record.success,
            error = record.error.as_deref().unwrap_or(""),
            reason = %record.reason,
            "auto method selection"
        );
        id
    }
}

/// Append-only in-memory sink for tests and embedders without a store.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<SelectionRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records written so far.
    pub fn records(&self) -> Vec<SelectionRecord> {
        self.records.lock().expect("audit sink poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("audit sink poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn log_selection(&self, record: &SelectionRecord) -> u64 {
        let mut records = self.records.lock().expect("audit sink poisoned");
        records.push(record.clone());
        records.len() as u64
    }
}
