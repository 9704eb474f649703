//! Singer message types
//!
//! One JSON document per line, discriminated by the `type` field. Taps
//! write these to stdout; targets read them from stdin.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single Singer protocol message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Declares a stream's JSON schema and key properties
    #[serde(rename = "SCHEMA")]
    Schema {
        stream: String,
        schema: Value,
        key_properties: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bookmark_properties: Option<Vec<String>>,
    },

    /// One extracted record
    #[serde(rename = "RECORD")]
    Record {
        stream: String,
        record: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_extracted: Option<DateTime<Utc>>,
    },

    /// Bookmark checkpoint; the target echoes the last processed value
    #[serde(rename = "STATE")]
    State { value: Value },
}

impl Message {
    /// Build a RECORD message stamped with the current extraction time.
    pub fn record(stream: impl Into<String>, record: Value) -> Self {
        Message::Record {
            stream: stream.into(),
            record,
            time_extracted: Some(Utc::now()),
        }
    }

    /// Build a SCHEMA message.
    pub fn schema(
        stream: impl Into<String>,
        schema: Value,
        key_properties: &[&str],
        bookmark_properties: Option<&[&str]>,
    ) -> Self {
        Message::Schema {
            stream: stream.into(),
            schema,
            key_properties: key_properties.iter().map(|s| s.to_string()).collect(),
            bookmark_properties: bookmark_properties
                .map(|props| props.iter().map(|s| s.to_string()).collect()),
        }
    }

    /// Build a STATE message.
    pub fn state(value: Value) -> Self {
        Message::State { value }
    }

    /// The stream this message belongs to, if any.
    pub fn stream(&self) -> Option<&str> {
        match self {
            Message::Schema { stream, .. } | Message::Record { stream, .. } => Some(stream),
            Message::State { .. } => None,
        }
    }
}
