//! Deterministic work sharding
//!
//! A work unit (symbol, contract, coin id) belongs to exactly one of
//! `count` shards. Assignment must be identical across processes and
//! releases, so it hashes with MD5 rather than the std hasher, whose
//! output is not stable across runs. Workers configured with distinct ids
//! and a common count form a strict partition of the workload.

use md5::{Digest, Md5};

use crate::config::ShardConfig;
use crate::error::TapError;

/// One worker's slice of the workload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shard {
    id: u32,
    count: u32,
}

impl Shard {
    /// Create a shard; `id` must be in `[0, count)`.
    pub fn new(id: u32, count: u32) -> Result<Self, TapError> {
        if count == 0 {
            return Err(TapError::Config("shard count must be at least 1".to_string()));
        }
        if id >= count {
            return Err(TapError::Config(format!(
                "shard id {} out of range for count {}",
                id, count
            )));
        }
        Ok(Self { id, count })
    }

    /// Build from the config section, with optional CLI overrides.
    pub fn from_config(
        config: &ShardConfig,
        id_override: Option<u32>,
        count_override: Option<u32>,
    ) -> Result<Self, TapError> {
        Self::new(
            id_override.unwrap_or(config.id),
            count_override.unwrap_or(config.count),
        )
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Whether this worker owns the given work unit.
    pub fn contains(&self, key: &str) -> bool {
        if self.count == 1 {
            return true;
        }
        let digest = Md5::digest(key.as_bytes());
        let hash = u128::from_be_bytes(digest.into());
        hash % u128::from(self.count) == u128::from(self.id)
    }

    /// Whether this worker runs streams that have no partition dimension.
    /// Exactly one shard must emit them, so they run on shard 0 only.
    pub fn is_leader(&self) -> bool {
        self.id == 0
    }
}
