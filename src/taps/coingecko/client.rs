//! CoinGecko REST client
//!
//! Unauthenticated API with aggressive rate limits; 429s and timeouts
//! back off for up to five tries.

use serde_json::Value;
use std::time::Duration;

use crate::error::TapError;
use crate::http::{RestClient, RetryPolicy};

pub struct CoingeckoClient {
    rest: RestClient,
}

impl CoingeckoClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TapError> {
        let rest = RestClient::new(
            base_url,
            timeout,
            None,
            RetryPolicy {
                max_tries: 5,
                factor_secs: 5.0,
            },
        )?;
        Ok(Self { rest })
    }

    /// All coin ids known to the API.
    pub async fn coins_list(&self) -> Result<Vec<String>, TapError> {
        let params = [("include_platform", "false".to_string())];
        let value = self.rest.get_json("coins_list", "/v3/coins/list", &params).await?;
        Ok(value
            .as_array()
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .filter(|id| !id.is_empty())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Full data document for one coin.
    pub async fn coin_data(&self, id: &str) -> Result<Value, TapError> {
        let params = [
            ("localization", "false".to_string()),
            ("tickers", "false".to_string()),
        ];
        let path = format!("/v3/coins/{}", id);
        self.rest.get_json("coin_data", &path, &params).await
    }
}
