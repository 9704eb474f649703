//! Index mapping file
//!
//! A TOML file declaring, per stream, which index receives its records,
//! which attributes survive, and which attributes form the surrogate
//! object id. `${VAR}` references resolve from the environment, so index
//! names can carry the deployment environment.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::resolve_env;
use crate::error::TargetError;

#[derive(Debug, Clone, Deserialize)]
pub struct IndexMapping {
    pub streams: BTreeMap<String, IndexSpec>,
}

/// One stream's index configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexSpec {
    /// Name of the index records land in
    pub index: String,

    /// Attributes copied into each search record
    pub attributes: Vec<String>,

    /// Attributes concatenated into the surrogate `objectID`
    pub primary_key: Vec<String>,

    /// Index settings pushed once at startup
    #[serde(default)]
    pub settings: Option<Value>,
}

impl IndexMapping {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TargetError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| TargetError::Mapping(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, TargetError> {
        let resolved = resolve_env(content);
        toml::from_str(&resolved).map_err(|e| TargetError::Mapping(e.to_string()))
    }

    /// Spec for a stream, or the unmapped-stream error.
    pub fn spec_for(&self, stream: &str) -> Result<&IndexSpec, TargetError> {
        self.streams
            .get(stream)
            .ok_or_else(|| TargetError::UnmappedStream(stream.to_string()))
    }
}
