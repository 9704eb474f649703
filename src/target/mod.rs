//! Search-index target
//!
//! Consumes Singer messages on stdin and writes batches of search records
//! into the index named by each stream's mapping entry. STATE messages
//! are echoed to stdout only after every record that preceded them has
//! been flushed, so a resumed pipeline never skips unflushed data.

mod index;
mod mapping;
mod sink;

pub use index::{HttpSearchIndex, SearchIndex};
pub use mapping::{IndexMapping, IndexSpec};
pub use sink::{Sink, MAX_BATCH_SIZE};

use serde_json::Value;
use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::error::TargetError;
use crate::singer::{Message, MessageReader};
use crate::telemetry::records_indexed;

pub struct IndexTarget<I: SearchIndex> {
    mapping: IndexMapping,
    index: I,
    sinks: HashMap<String, Sink>,
}

impl<I: SearchIndex> IndexTarget<I> {
    pub fn new(mapping: IndexMapping, index: I) -> Self {
        Self {
            mapping,
            index,
            sinks: HashMap::new(),
        }
    }

    /// Push configured index settings for every mapped stream.
    pub async fn apply_settings(&self) -> Result<(), TargetError> {
        for (stream, spec) in &self.mapping.streams {
            if let Some(settings) = &spec.settings {
                tracing::info!(stream, index = %spec.index, "applying index settings");
                self.index.set_settings(&spec.index, settings).await?;
            }
        }
        Ok(())
    }

    async fn flush(&mut self, stream: &str) -> Result<(), TargetError> {
        let Some(sink) = self.sinks.get_mut(stream) else {
            return Ok(());
        };
        if sink.is_empty() {
            return Ok(());
        }
        let index = sink.index().to_string();
        let batch = sink.drain();
        tracing::debug!(stream, index = %index, records = batch.len(), "flushing batch");
        self.index.save_objects(&index, &batch).await?;
        records_indexed(&index, batch.len() as u64);
        Ok(())
    }

    async fn flush_all(&mut self) -> Result<(), TargetError> {
        let streams: Vec<String> = self.sinks.keys().cloned().collect();
        for stream in streams {
            self.flush(&stream).await?;
        }
        Ok(())
    }

    /// Drive the target over a Singer message stream.
    pub async fn run<R: BufRead, W: Write>(
        &mut self,
        input: R,
        mut out: W,
    ) -> Result<(), TargetError> {
        for message in MessageReader::new(input) {
            match message? {
                Message::Schema { stream, .. } => {
                    let spec = self.mapping.spec_for(&stream)?.clone();
                    tracing::info!(stream = %stream, index = %spec.index, "stream registered");
                    self.sinks
                        .entry(stream.clone())
                        .or_insert_with(|| Sink::new(stream, spec));
                }
                Message::Record { stream, record, .. } => {
                    let sink = self
                        .sinks
                        .get_mut(&stream)
                        .ok_or_else(|| TargetError::UnknownStream(stream.clone()))?;
                    if sink.push(&record)? {
                        self.flush(&stream).await?;
                    }
                }
                Message::State { value } => {
                    self.flush_all().await?;
                    write_state_line(&mut out, &value)?;
                }
            }
        }
        self.flush_all().await?;
        Ok(())
    }
}

fn write_state_line<W: Write>(out: &mut W, value: &Value) -> Result<(), TargetError> {
    let line = serde_json::to_string(value)
        .map_err(|e| TargetError::Index(format!("state serialization: {}", e)))?;
    writeln!(out, "{}", line).map_err(|e| TargetError::Index(format!("state write: {}", e)))?;
    out.flush()
        .map_err(|e| TargetError::Index(format!("state write: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Records every call instead of talking to a real index
    #[derive(Default)]
    struct FakeIndex {
        saved: Mutex<Vec<(String, Vec<Value>)>>,
        settings: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl SearchIndex for FakeIndex {
        async fn save_objects(&self, index: &str, objects: &[Value]) -> Result<(), TargetError> {
            self.saved
                .lock()
                .unwrap()
                .push((index.to_string(), objects.to_vec()));
            Ok(())
        }

        async fn set_settings(&self, index: &str, settings: &Value) -> Result<(), TargetError> {
            self.settings
                .lock()
                .unwrap()
                .push((index.to_string(), settings.clone()));
            Ok(())
        }
    }

    fn mapping() -> IndexMapping {
        IndexMapping::parse(
            r#"
            [streams.coingecko_coin]
            index = "coins"
            attributes = ["id", "name"]
            primary_key = ["id"]

            [streams.coingecko_coin.settings]
            searchableAttributes = ["name"]
        "#,
        )
        .unwrap()
    }

    fn schema_line() -> String {
        json!({
            "type": "SCHEMA",
            "stream": "coingecko_coin",
            "schema": {"type": "object"},
            "key_properties": ["id"]
        })
        .to_string()
    }

    fn record_line(id: &str) -> String {
        json!({
            "type": "RECORD",
            "stream": "coingecko_coin",
            "record": {"id": id, "name": id.to_uppercase(), "extra": 1}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_records_flush_at_eof() {
        let input = format!("{}\n{}\n{}\n", schema_line(), record_line("bitcoin"), record_line("ethereum"));
        let mut target = IndexTarget::new(mapping(), FakeIndex::default());
        let mut out = Vec::new();
        target.run(Cursor::new(input), &mut out).await.unwrap();

        let saved = target.index.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, "coins");
        assert_eq!(saved[0].1.len(), 2);
        assert_eq!(saved[0].1[0]["objectID"], "bitcoin");
        assert!(saved[0].1[0].get("extra").is_none());
    }

    #[tokio::test]
    async fn test_state_echoed_after_flush() {
        let input = format!(
            "{}\n{}\n{}\n",
            schema_line(),
            record_line("bitcoin"),
            json!({"type": "STATE", "value": {"bookmarks": {"coingecko_coin": {}}}})
        );
        let mut target = IndexTarget::new(mapping(), FakeIndex::default());
        let mut out = Vec::new();
        target.run(Cursor::new(input), &mut out).await.unwrap();

        // Data flushed before the state line went out
        assert_eq!(target.index.saved.lock().unwrap().len(), 1);
        let echoed: Value = serde_json::from_slice(&out).unwrap();
        assert!(echoed["bookmarks"]["coingecko_coin"].is_object());
    }

    #[tokio::test]
    async fn test_record_before_schema_is_error() {
        let input = format!("{}\n", record_line("bitcoin"));
        let mut target = IndexTarget::new(mapping(), FakeIndex::default());
        let err = target
            .run(Cursor::new(input), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TargetError::UnknownStream(_)));
    }

    #[tokio::test]
    async fn test_unmapped_stream_is_fatal() {
        let input = json!({
            "type": "SCHEMA",
            "stream": "mystery",
            "schema": {},
            "key_properties": []
        })
        .to_string();
        let mut target = IndexTarget::new(mapping(), FakeIndex::default());
        let err = target
            .run(Cursor::new(input), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TargetError::UnmappedStream(_)));
    }

    #[tokio::test]
    async fn test_batch_flushes_at_max_size() {
        let mut input = schema_line();
        input.push('\n');
        for i in 0..MAX_BATCH_SIZE + 5 {
            input.push_str(&record_line(&format!("coin-{}", i)));
            input.push('\n');
        }
        let mut target = IndexTarget::new(mapping(), FakeIndex::default());
        target.run(Cursor::new(input), &mut Vec::new()).await.unwrap();

        let saved = target.index.saved.lock().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].1.len(), MAX_BATCH_SIZE);
        assert_eq!(saved[1].1.len(), 5);
    }

    #[tokio::test]
    async fn test_apply_settings() {
        let target = IndexTarget::new(mapping(), FakeIndex::default());
        target.apply_settings().await.unwrap();
        let settings = target.index.settings.lock().unwrap();
        assert_eq!(settings.len(), 1);
        assert_eq!(settings[0].0, "coins");
    }
}
