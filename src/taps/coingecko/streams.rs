//! CoinGecko stream definitions

use serde_json::Value;
use std::io::Write;

use super::client::CoingeckoClient;
use crate::config::CoingeckoConfig;
use crate::singer::{MessageWriter, TapState};
use crate::telemetry::records_emitted;

pub const COIN_STREAM: &str = "coingecko_coin";
pub const COIN_KEYS: &[&str] = &["id"];

/// Per-coin data documents
pub struct CoinDataStream {
    pub schema: Value,
}

impl CoinDataStream {
    /// Coin ids for this run: the configured list, or discovery via the
    /// coins list endpoint (sorted by id, optionally capped).
    pub async fn coin_ids(
        &self,
        client: &CoingeckoClient,
        config: &CoingeckoConfig,
    ) -> anyhow::Result<Vec<String>> {
        if !config.coins.is_empty() {
            tracing::info!(coins = config.coins.len(), "using coins from the config");
            return Ok(config
                .coins
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect());
        }

        tracing::info!("loading coins from the list endpoint");
        let mut ids = client.coins_list().await?;
        ids.sort();
        if let Some(limit) = config.coins_limit {
            ids.truncate(limit);
        }
        Ok(ids)
    }

    pub async fn sync<W: Write>(
        &self,
        client: &CoingeckoClient,
        config: &CoingeckoConfig,
        state: &TapState,
        out: &mut MessageWriter<W>,
    ) -> anyhow::Result<()> {
        out.write_schema_once(COIN_STREAM, &self.schema, COIN_KEYS, None)?;

        let ids = self.coin_ids(client, config).await?;
        tracing::info!(stream = COIN_STREAM, coins = ids.len(), "starting sync");

        let mut emitted = 0u64;
        for id in &ids {
            let record = match client.coin_data(id).await {
                Ok(record) => record,
                Err(e) => {
                    tracing::error!(stream = COIN_STREAM, coin = %id, error = %e, "request failed");
                    continue;
                }
            };
            out.write_record(COIN_STREAM, record)?;
            emitted += 1;
            out.checkpoint(state, 100)?;
        }

        records_emitted(COIN_STREAM, emitted);
        tracing::info!(stream = COIN_STREAM, records = emitted, "sync finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_configured_coins_win_over_discovery() {
        let stream = CoinDataStream {
            schema: json!({"type": "object"}),
        };
        let client =
            CoingeckoClient::new("http://localhost:9", std::time::Duration::from_secs(1)).unwrap();
        let config = CoingeckoConfig {
            coins: vec![" bitcoin ".to_string(), "".to_string(), "ethereum".to_string()],
            coins_limit: None,
            ..Default::default()
        };
        // Discovery would hit the network; configured coins short-circuit it
        let ids = stream.coin_ids(&client, &config).await.unwrap();
        assert_eq!(ids, vec!["bitcoin", "ethereum"]);
    }
}
