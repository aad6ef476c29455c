//! Entity resolution timing records
//!
//! Copyright (c) 2025 DataPoint Team
//! Licensed under the Apache-2.0 license

use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

/// Timing of one traced entity resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceRecord {
    pub entity_id: String,
    /// Unique id of this resolution, also visible as `$..euid`
    pub euid: String,
    pub duration: Duration,
}

impl TraceRecord {
    /// Label in the `⧖ entity(euid)` format used by log output
    pub fn label(&self) -> String {
        format!("⧖ {}({})", self.entity_id, self.euid)
    }
}

/// Records collected during a single transform
#[derive(Debug, Default)]
pub struct TraceLog {
    records: Mutex<Vec<TraceRecord>>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, record: TraceRecord) {
        tracing::info!(
            entity_id = %record.entity_id,
            euid = %record.euid,
            duration_ms = record.duration.as_secs_f64() * 1000.0,
            "{}",
            record.label()
        );

        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }

    pub fn snapshot(&self) -> Vec<TraceRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn into_records(self) -> Vec<TraceRecord> {
        self.records.into_inner().unwrap_or_default()
    }
}
