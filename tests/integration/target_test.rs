//! End-to-end target run against an in-memory search index

use async_trait::async_trait;
use fintap::error::TargetError;
use fintap::target::{IndexMapping, IndexTarget, SearchIndex};
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct RecordingIndex {
    saved: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
}

#[async_trait]
impl SearchIndex for RecordingIndex {
    async fn save_objects(&self, index: &str, objects: &[Value]) -> Result<(), TargetError> {
        self.saved
            .lock()
            .unwrap()
            .push((index.to_string(), objects.to_vec()));
        Ok(())
    }

    async fn set_settings(&self, _index: &str, _settings: &Value) -> Result<(), TargetError> {
        Ok(())
    }
}

fn mapping() -> IndexMapping {
    IndexMapping::parse(
        r#"
        [streams.raw_historical_prices]
        index = "prices"
        attributes = ["code", "date", "close"]
        primary_key = ["code", "date"]
    "#,
    )
    .unwrap()
}

#[tokio::test]
async fn tap_lines_land_in_the_index_and_state_is_acknowledged() {
    let lines = [
        json!({
            "type": "SCHEMA",
            "stream": "raw_historical_prices",
            "schema": {"type": "object"},
            "key_properties": ["code", "date"]
        }),
        json!({
            "type": "RECORD",
            "stream": "raw_historical_prices",
            "record": {"code": "AAPL.US", "date": "2024-06-03", "close": 194.03, "volume": 1}
        }),
        json!({
            "type": "RECORD",
            "stream": "raw_historical_prices",
            "record": {"code": "AAPL.US", "date": "2024-06-04", "close": 194.35, "volume": 2}
        }),
        json!({
            "type": "STATE",
            "value": {"bookmarks": {"raw_historical_prices": {"last_symbol": "AAPL.US"}}}
        }),
    ];
    let input = lines
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join("\n");

    let index = RecordingIndex::default();
    let mut target = IndexTarget::new(mapping(), index.clone());
    let mut out = Vec::new();
    target.run(Cursor::new(input), &mut out).await.unwrap();

    let saved = index.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    let (index_name, batch) = &saved[0];
    assert_eq!(index_name, "prices");
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0]["objectID"], "AAPL.US2024-06-03");
    assert!(batch[0].get("volume").is_none());

    let echoed: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(
        echoed["bookmarks"]["raw_historical_prices"]["last_symbol"],
        "AAPL.US"
    );
}
