//! Tap implementations
//!
//! One module per upstream API. Each tap exposes a catalog for discovery
//! mode and an async `sync` that drives its streams against a
//! `MessageWriter`.

pub mod coingecko;
pub mod eodhd;
pub mod polygon;

use serde_json::{json, Value};

use crate::error::TapError;

/// Catalog entry for one stream
pub struct StreamDef {
    pub name: &'static str,
    pub key_properties: &'static [&'static str],
    pub schema: Value,
}

/// Render the discovery catalog.
pub fn catalog_json(streams: &[StreamDef]) -> Value {
    let entries: Vec<Value> = streams
        .iter()
        .map(|s| {
            json!({
                "tap_stream_id": s.name,
                "stream": s.name,
                "schema": s.schema,
                "key_properties": s.key_properties,
            })
        })
        .collect();
    json!({ "streams": entries })
}

/// Empty selection means every stream.
pub fn is_selected(selection: &[String], name: &str) -> bool {
    selection.is_empty() || selection.iter().any(|s| s == name)
}

/// Parse an embedded JSON schema file.
pub(crate) fn parse_schema(stream: &'static str, text: &'static str) -> Result<Value, TapError> {
    serde_json::from_str(text).map_err(|source| TapError::Schema {
        stream: stream.to_string(),
        source,
    })
}
