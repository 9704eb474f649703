//! Tap state (bookmarks)
//!
//! State is exchanged as the `value` of STATE messages and optionally
//! seeded from a file at startup. Partitioned price streams remember, per
//! symbol, the last synced day and the first data point of the series;
//! cursor streams remember the last processed symbol.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::TapError;

/// Full tap state: one entry per stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TapState {
    #[serde(default)]
    pub bookmarks: BTreeMap<String, StreamState>,
}

/// Per-stream bookmark
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamState {
    /// Partitioned streams: one entry per symbol/contract/coin
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<PartitionState>,

    /// Cursor streams: the last symbol fully processed in sorted order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_symbol: Option<String>,
}

/// Bookmark for one partition of a partitioned stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionState {
    /// Partition identity: symbol, contract name, or coin id
    pub key: String,

    /// Last day covered by a completed fetch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,

    /// First data point of the series as of the last full fetch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_record: Option<FirstRecord>,
}

/// The remembered first data point used by staleness detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirstRecord {
    /// Epoch milliseconds of the first bar
    pub timestamp_ms: i64,

    /// Close price of the first bar
    pub close: Decimal,
}

impl TapState {
    /// Read state from a JSON file (a bare state value, as emitted in
    /// STATE messages).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TapError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| TapError::State(format!("{}: {}", path.as_ref().display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| TapError::State(format!("{}: {}", path.as_ref().display(), e)))
    }

    /// Mutable bookmark for a stream, created empty if absent.
    pub fn stream_mut(&mut self, stream: &str) -> &mut StreamState {
        self.bookmarks.entry(stream.to_string()).or_default()
    }

    /// Bookmark for a stream, if any.
    pub fn stream(&self, stream: &str) -> Option<&StreamState> {
        self.bookmarks.get(stream)
    }

    /// Serialize into a STATE message value.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

impl StreamState {
    /// Find a partition bookmark by key.
    pub fn partition(&self, key: &str) -> Option<&PartitionState> {
        self.partitions.iter().find(|p| p.key == key)
    }

    /// Insert or replace a partition bookmark.
    pub fn upsert_partition(&mut self, partition: PartitionState) {
        match self.partitions.iter_mut().find(|p| p.key == partition.key) {
            Some(existing) => *existing = partition,
            None => self.partitions.push(partition),
        }
    }
}
