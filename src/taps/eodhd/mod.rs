//! EOD Historical Data tap
//!
//! Fundamentals, dividends, end-of-day prices, and options summaries for
//! a configured symbol list, with a sorted-order resume cursor per
//! stream.

mod client;
mod streams;

pub use client::EodhdClient;
pub use streams::{
    plan_symbols, EodEndpoint, EodStream, DIVIDENDS_STREAM, EOD_STREAM, FUNDAMENTALS_STREAM,
    OPTIONS_STREAM,
};

use serde_json::Value;
use std::io::Write;
use std::time::Duration;

use crate::config::{EodhdConfig, HttpConfig};
use crate::error::TapError;
use crate::singer::{MessageWriter, TapState};
use crate::taps::{catalog_json, is_selected, parse_schema, StreamDef};

pub struct EodhdTap {
    client: EodhdClient,
    symbols: Vec<String>,
    start_symbol: Option<String>,
    streams: Vec<EodStream>,
}

fn build_streams() -> Result<Vec<EodStream>, TapError> {
    Ok(vec![
        EodStream {
            name: FUNDAMENTALS_STREAM,
            endpoint: EodEndpoint::Fundamentals,
            key_properties: &["code"],
            replication_key: "UpdatedAt",
            state_interval: 100,
            schema: parse_schema(FUNDAMENTALS_STREAM, include_str!("schemas/fundamentals.json"))?,
        },
        EodStream {
            name: DIVIDENDS_STREAM,
            endpoint: EodEndpoint::Dividends,
            key_properties: &["code", "date"],
            replication_key: "date",
            state_interval: 1000,
            schema: parse_schema(DIVIDENDS_STREAM, include_str!("schemas/dividends.json"))?,
        },
        EodStream {
            name: EOD_STREAM,
            endpoint: EodEndpoint::EodPrices,
            key_properties: &["code", "date"],
            replication_key: "date",
            state_interval: 1000,
            schema: parse_schema(EOD_STREAM, include_str!("schemas/eod.json"))?,
        },
        EodStream {
            name: OPTIONS_STREAM,
            endpoint: EodEndpoint::Options,
            key_properties: &["code", "expirationDate"],
            replication_key: "expirationDate",
            state_interval: 1000,
            schema: parse_schema(OPTIONS_STREAM, include_str!("schemas/options.json"))?,
        },
    ])
}

impl EodhdTap {
    pub fn new(config: &EodhdConfig, http: &HttpConfig) -> Result<Self, TapError> {
        let client = EodhdClient::new(
            &config.base_url,
            &config.api_token,
            Duration::from_secs(http.timeout_secs),
        )?;

        let mut symbols: Vec<String> = config
            .symbols
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        symbols.sort();
        symbols.dedup();

        Ok(Self {
            client,
            symbols,
            start_symbol: config.start_symbol.clone(),
            streams: build_streams()?,
        })
    }

    pub fn catalog() -> Result<Value, TapError> {
        let streams: Vec<StreamDef> = build_streams()?
            .into_iter()
            .map(|s| StreamDef {
                name: s.name,
                key_properties: s.key_properties,
                schema: s.schema,
            })
            .collect();
        Ok(catalog_json(&streams))
    }

    pub async fn sync<W: Write>(
        &self,
        state: &mut TapState,
        out: &mut MessageWriter<W>,
        selection: &[String],
    ) -> anyhow::Result<()> {
        for stream in &self.streams {
            if is_selected(selection, stream.name) {
                stream
                    .sync(
                        &self.client,
                        &self.symbols,
                        self.start_symbol.as_deref(),
                        state,
                        out,
                    )
                    .await?;
                out.write_state(state)?;
            }
        }
        out.write_state(state)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EodhdConfig {
        EodhdConfig {
            api_token: "tok".to_string(),
            symbols: vec![
                "MSFT.US".to_string(),
                " AAPL.US ".to_string(),
                "AAPL.US".to_string(),
                "".to_string(),
            ],
            start_symbol: None,
            base_url: "https://eodhistoricaldata.com/api".to_string(),
        }
    }

    #[test]
    fn test_symbols_sorted_trimmed_deduped() {
        let tap = EodhdTap::new(&config(), &HttpConfig::default()).unwrap();
        assert_eq!(tap.symbols, vec!["AAPL.US", "MSFT.US"]);
    }

    #[test]
    fn test_catalog_lists_all_streams() {
        let catalog = EodhdTap::catalog().unwrap();
        let names: Vec<&str> = catalog["streams"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["tap_stream_id"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                FUNDAMENTALS_STREAM,
                DIVIDENDS_STREAM,
                EOD_STREAM,
                OPTIONS_STREAM
            ]
        );
    }
}
