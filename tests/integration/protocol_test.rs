//! Singer codec round-trip: what a tap writes, a target can read

use fintap::singer::{
    FirstRecord, Message, MessageReader, MessageWriter, PartitionState, TapState,
};
use rust_decimal_macros::dec;
use serde_json::json;
use std::io::Cursor;

#[test]
fn tap_output_parses_back_message_for_message() {
    let mut state = TapState::default();
    state
        .stream_mut("polygon_stocks_historical_prices")
        .upsert_partition(PartitionState {
            key: "AAPL".to_string(),
            date_to: chrono::NaiveDate::from_ymd_opt(2024, 6, 1),
            first_record: Some(FirstRecord {
                timestamp_ms: 315619200000,
                close: dec!(4.2675),
            }),
        });

    let mut buf = Vec::new();
    let mut writer = MessageWriter::new(&mut buf);
    writer
        .write_schema_once(
            "polygon_stocks_historical_prices",
            &json!({"type": "object"}),
            &["t", "symbol"],
            Some(&["t"]),
        )
        .unwrap();
    writer
        .write_record(
            "polygon_stocks_historical_prices",
            json!({"symbol": "AAPL", "t": 315619200000i64, "c": 4.2675}),
        )
        .unwrap();
    writer.write_state(&state).unwrap();

    let messages: Vec<Message> = MessageReader::new(Cursor::new(buf))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(messages.len(), 3);

    match &messages[0] {
        Message::Schema {
            stream,
            key_properties,
            bookmark_properties,
            ..
        } => {
            assert_eq!(stream, "polygon_stocks_historical_prices");
            assert_eq!(key_properties, &["t", "symbol"]);
            assert_eq!(bookmark_properties.as_deref(), Some(&["t".to_string()][..]));
        }
        other => panic!("expected schema, got {:?}", other),
    }

    match &messages[1] {
        Message::Record {
            record,
            time_extracted,
            ..
        } => {
            assert_eq!(record["symbol"], "AAPL");
            assert!(time_extracted.is_some());
        }
        other => panic!("expected record, got {:?}", other),
    }

    match &messages[2] {
        Message::State { value } => {
            let restored: TapState = serde_json::from_value(value.clone()).unwrap();
            assert_eq!(restored, state);
        }
        other => panic!("expected state, got {:?}", other),
    }
}

#[test]
fn state_survives_a_file_round_trip() {
    let mut state = TapState::default();
    state.stream_mut("dividends").last_symbol = Some("MSFT.US".to_string());

    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), serde_json::to_string(&state).unwrap()).unwrap();

    let restored = TapState::load(file.path()).unwrap();
    assert_eq!(restored, state);
}
