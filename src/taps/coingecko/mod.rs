//! CoinGecko tap
//!
//! One stream of per-coin data documents, partitioned by coin id.

mod client;
mod streams;

pub use client::CoingeckoClient;
pub use streams::{CoinDataStream, COIN_KEYS, COIN_STREAM};

use serde_json::Value;
use std::io::Write;
use std::time::Duration;

use crate::config::{CoingeckoConfig, HttpConfig};
use crate::error::TapError;
use crate::singer::{MessageWriter, TapState};
use crate::taps::{catalog_json, is_selected, parse_schema, StreamDef};

pub struct CoingeckoTap {
    client: CoingeckoClient,
    config: CoingeckoConfig,
    coin_data: CoinDataStream,
}

impl CoingeckoTap {
    pub fn new(config: &CoingeckoConfig, http: &HttpConfig) -> Result<Self, TapError> {
        let client = CoingeckoClient::new(
            &config.base_url,
            Duration::from_secs(http.timeout_secs),
        )?;
        Ok(Self {
            client,
            config: config.clone(),
            coin_data: CoinDataStream {
                schema: parse_schema(COIN_STREAM, include_str!("schemas/coin_data.json"))?,
            },
        })
    }

    pub fn catalog() -> Result<Value, TapError> {
        let streams = vec![StreamDef {
            name: COIN_STREAM,
            key_properties: COIN_KEYS,
            schema: parse_schema(COIN_STREAM, include_str!("schemas/coin_data.json"))?,
        }];
        Ok(catalog_json(&streams))
    }

    pub async fn sync<W: Write>(
        &self,
        state: &mut TapState,
        out: &mut MessageWriter<W>,
        selection: &[String],
    ) -> anyhow::Result<()> {
        if is_selected(selection, COIN_STREAM) {
            self.coin_data
                .sync(&self.client, &self.config, state, out)
                .await?;
        }
        out.write_state(state)?;
        Ok(())
    }
}
