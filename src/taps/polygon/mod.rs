//! Polygon.io tap
//!
//! Market status plus daily historical prices for stocks, option
//! contracts, and crypto pairs. The price streams are partitioned per
//! symbol with first-record staleness detection and shard-aware
//! partition planning.

mod client;
mod streams;

pub use client::{PolygonClient, CRYPTO_SNAPSHOT_PATH, STOCKS_SNAPSHOT_PATH};
pub use streams::{AggsStream, MarketStatusStream, MARKET_STATUS_KEYS, MARKET_STATUS_STREAM};

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::io::Write;
use std::time::Duration;

use crate::config::{HttpConfig, PolygonConfig};
use crate::error::TapError;
use crate::singer::{MessageWriter, TapState};
use crate::sync::Shard;
use crate::taps::{catalog_json, is_selected, parse_schema, StreamDef};

pub const STOCKS_STREAM: &str = "polygon_stocks_historical_prices";
pub const OPTIONS_STREAM: &str = "polygon_options_historical_prices";
pub const CRYPTO_STREAM: &str = "polygon_crypto_historical_prices";

fn stocks_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1980, 1, 1).expect("static date")
}

fn crypto_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2009, 1, 1).expect("static date")
}

pub struct PolygonTap {
    client: PolygonClient,
    shard: Shard,
    market_status: MarketStatusStream,
    stocks: AggsStream,
    options: AggsStream,
    crypto: AggsStream,
}

impl PolygonTap {
    pub fn new(config: &PolygonConfig, http: &HttpConfig, shard: Shard) -> Result<Self, TapError> {
        let client = PolygonClient::new(
            &config.base_url,
            &config.api_key,
            Duration::from_secs(http.timeout_secs),
        )?;

        Ok(Self {
            client,
            shard,
            market_status: MarketStatusStream {
                schema: parse_schema(
                    MARKET_STATUS_STREAM,
                    include_str!("schemas/marketstatus_upcoming.json"),
                )?,
            },
            stocks: AggsStream {
                name: STOCKS_STREAM,
                id_field: "symbol",
                ticker_prefix: "",
                epoch: stocks_epoch(),
                tolerance: dec!(0.001),
                snapshot_path: Some(STOCKS_SNAPSHOT_PATH),
                config_symbols: config.stock_symbols.clone(),
                schema: parse_schema(
                    STOCKS_STREAM,
                    include_str!("schemas/stocks_historical_prices.json"),
                )?,
            },
            options: AggsStream {
                name: OPTIONS_STREAM,
                id_field: "contract_name",
                ticker_prefix: "O:",
                epoch: stocks_epoch(),
                tolerance: dec!(0.001),
                snapshot_path: None,
                config_symbols: config.option_contract_names.clone(),
                schema: parse_schema(
                    OPTIONS_STREAM,
                    include_str!("schemas/options_historical_prices.json"),
                )?,
            },
            crypto: AggsStream {
                name: CRYPTO_STREAM,
                id_field: "symbol",
                ticker_prefix: "X:",
                epoch: crypto_epoch(),
                tolerance: dec!(0.000001),
                snapshot_path: Some(CRYPTO_SNAPSHOT_PATH),
                config_symbols: config.crypto_symbols.clone(),
                schema: parse_schema(
                    CRYPTO_STREAM,
                    include_str!("schemas/crypto_historical_prices.json"),
                )?,
            },
        })
    }

    /// Discovery catalog for all polygon streams.
    pub fn catalog() -> Result<Value, TapError> {
        let streams = vec![
            StreamDef {
                name: MARKET_STATUS_STREAM,
                key_properties: MARKET_STATUS_KEYS,
                schema: parse_schema(
                    MARKET_STATUS_STREAM,
                    include_str!("schemas/marketstatus_upcoming.json"),
                )?,
            },
            StreamDef {
                name: STOCKS_STREAM,
                key_properties: &["t", "symbol"],
                schema: parse_schema(
                    STOCKS_STREAM,
                    include_str!("schemas/stocks_historical_prices.json"),
                )?,
            },
            StreamDef {
                name: OPTIONS_STREAM,
                key_properties: &["t", "contract_name"],
                schema: parse_schema(
                    OPTIONS_STREAM,
                    include_str!("schemas/options_historical_prices.json"),
                )?,
            },
            StreamDef {
                name: CRYPTO_STREAM,
                key_properties: &["t", "symbol"],
                schema: parse_schema(
                    CRYPTO_STREAM,
                    include_str!("schemas/crypto_historical_prices.json"),
                )?,
            },
        ];
        Ok(catalog_json(&streams))
    }

    /// Run the selected streams and finish with a STATE checkpoint.
    pub async fn sync<W: Write>(
        &self,
        state: &mut TapState,
        out: &mut MessageWriter<W>,
        selection: &[String],
    ) -> anyhow::Result<()> {
        if is_selected(selection, MARKET_STATUS_STREAM) {
            self.market_status
                .sync(&self.client, &self.shard, state, out)
                .await?;
        }
        for stream in [&self.stocks, &self.options, &self.crypto] {
            if is_selected(selection, stream.name) {
                stream.sync(&self.client, &self.shard, state, out).await?;
                out.write_state(state)?;
            }
        }
        out.write_state(state)?;
        Ok(())
    }
}
