//! Per-stream batching sink

use serde_json::{Map, Value};

use super::mapping::IndexSpec;
use crate::error::TargetError;

/// Max records per index write
pub const MAX_BATCH_SIZE: usize = 1000;

/// Buffers one stream's records until a batch is worth flushing
pub struct Sink {
    stream: String,
    spec: IndexSpec,
    buffer: Vec<Value>,
}

impl Sink {
    pub fn new(stream: impl Into<String>, spec: IndexSpec) -> Self {
        Self {
            stream: stream.into(),
            spec,
            buffer: Vec::new(),
        }
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn index(&self) -> &str {
        &self.spec.index
    }

    pub fn settings(&self) -> Option<&Value> {
        self.spec.settings.as_ref()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Convert and buffer one record. Returns true when the buffer has
    /// reached the batch size and should be flushed.
    pub fn push(&mut self, record: &Value) -> Result<bool, TargetError> {
        let search_record = self.to_search_record(record)?;
        self.buffer.push(search_record);
        Ok(self.buffer.len() >= MAX_BATCH_SIZE)
    }

    /// Take the buffered batch.
    pub fn drain(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.buffer)
    }

    /// Project the record onto the mapped attributes and derive the
    /// surrogate `objectID` from the primary-key attributes in order.
    fn to_search_record(&self, record: &Value) -> Result<Value, TargetError> {
        let mut search_record = Map::new();
        for attr in &self.spec.attributes {
            search_record.insert(
                attr.clone(),
                record.get(attr).cloned().unwrap_or(Value::Null),
            );
        }

        let mut object_id = String::new();
        for key_attr in &self.spec.primary_key {
            let part = record
                .get(key_attr)
                .ok_or_else(|| TargetError::MissingKeyAttribute {
                    stream: self.stream.clone(),
                    attribute: key_attr.clone(),
                })?;
            object_id.push_str(&key_part(part));
        }
        search_record.insert("objectID".to_string(), Value::String(object_id));

        Ok(Value::Object(search_record))
    }
}

/// Render a primary-key value the way it reads in JSON, without quotes
/// around strings.
fn key_part(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec() -> IndexSpec {
        IndexSpec {
            index: "stocks_prices".to_string(),
            attributes: vec!["symbol".to_string(), "c".to_string()],
            primary_key: vec!["symbol".to_string(), "t".to_string()],
            settings: None,
        }
    }

    #[test]
    fn test_search_record_projection_and_object_id() {
        let sink = Sink::new("polygon_stocks_historical_prices", spec());
        let record = json!({"symbol": "AAPL", "t": 315619200000i64, "c": 4.2675, "v": 1000});
        let search_record = sink.to_search_record(&record).unwrap();
        assert_eq!(search_record["symbol"], "AAPL");
        assert_eq!(search_record["c"], 4.2675);
        assert_eq!(search_record["objectID"], "AAPL315619200000");
        // Unmapped attributes are dropped
        assert!(search_record.get("v").is_none());
    }

    #[test]
    fn test_missing_attribute_becomes_null() {
        let sink = Sink::new("polygon_stocks_historical_prices", spec());
        let record = json!({"symbol": "AAPL", "t": 1});
        let search_record = sink.to_search_record(&record).unwrap();
        assert_eq!(search_record["c"], Value::Null);
    }

    #[test]
    fn test_missing_key_attribute_is_error() {
        let mut sink = Sink::new("polygon_stocks_historical_prices", spec());
        let record = json!({"symbol": "AAPL"});
        let err = sink.push(&record).unwrap_err();
        assert!(matches!(
            err,
            TargetError::MissingKeyAttribute { ref attribute, .. } if attribute == "t"
        ));
    }

    #[test]
    fn test_push_signals_full_batch() {
        let mut sink = Sink::new("s", spec());
        for i in 0..MAX_BATCH_SIZE - 1 {
            let full = sink
                .push(&json!({"symbol": "AAPL", "t": i, "c": 1.0}))
                .unwrap();
            assert!(!full);
        }
        let full = sink
            .push(&json!({"symbol": "AAPL", "t": MAX_BATCH_SIZE, "c": 1.0}))
            .unwrap();
        assert!(full);
        assert_eq!(sink.len(), MAX_BATCH_SIZE);

        let batch = sink.drain();
        assert_eq!(batch.len(), MAX_BATCH_SIZE);
        assert!(sink.is_empty());
    }
}
