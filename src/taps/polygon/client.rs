//! Polygon REST client
//!
//! Endpoint-level helpers over the shared `RestClient`. Snapshot
//! discovery failures degrade to an empty symbol list so that configured
//! symbols still sync.

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;

use crate::error::TapError;
use crate::http::{RestClient, RetryPolicy};
use crate::sync::PricePoint;

/// US stocks snapshot, used to discover actively traded tickers
pub const STOCKS_SNAPSHOT_PATH: &str = "/v2/snapshot/locale/us/markets/stocks/tickers";

/// Global crypto snapshot
pub const CRYPTO_SNAPSHOT_PATH: &str = "/v2/snapshot/locale/global/markets/crypto/tickers";

pub struct PolygonClient {
    rest: RestClient,
}

impl PolygonClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, TapError> {
        let rest = RestClient::new(
            base_url,
            timeout,
            Some(("apiKey", api_key.to_string())),
            RetryPolicy {
                max_tries: 6,
                factor_secs: 5.0,
            },
        )?;
        Ok(Self { rest })
    }

    /// Upcoming market status entries.
    pub async fn market_status_upcoming(&self) -> Result<Vec<Value>, TapError> {
        let value = self
            .rest
            .get_json("marketstatus_upcoming", "/v1/marketstatus/upcoming", &[])
            .await?;
        match value {
            Value::Array(rows) => Ok(rows),
            other => Err(TapError::Decode {
                url: "/v1/marketstatus/upcoming".to_string(),
                source: serde_json::Error::io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("expected array, got {}", other),
                )),
            }),
        }
    }

    /// Daily aggregate bars for a ticker over an inclusive date range.
    ///
    /// `ticker` must already carry its market prefix (`O:`, `X:`).
    pub async fn aggs_daily(
        &self,
        ticker: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<Value>, TapError> {
        let path = format!(
            "/v2/aggs/ticker/{}/range/1/day/{}/{}",
            ticker, date_from, date_to
        );
        let params = [
            ("adjusted", "true".to_string()),
            ("sort", "asc".to_string()),
            ("limit", "50000".to_string()),
        ];
        let value = self.rest.get_json("aggs_daily", &path, &params).await?;
        Ok(value
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// The single bar at one date, reduced to the staleness probe shape.
    pub async fn bar_at(
        &self,
        ticker: &str,
        date: NaiveDate,
    ) -> Result<Option<PricePoint>, TapError> {
        let rows = self.aggs_daily(ticker, date, date).await?;
        Ok(rows.first().and_then(price_point))
    }

    /// Ticker symbols from a snapshot endpoint. A payload without
    /// `status: "OK"` is logged and yields nothing; configured symbols
    /// are unaffected.
    pub async fn snapshot_tickers(&self, path: &'static str) -> Result<Vec<String>, TapError> {
        let value = self.rest.get_json("snapshot_tickers", path, &[]).await?;
        if value.get("status").and_then(Value::as_str) != Some("OK") {
            tracing::error!(path, payload = %value, "snapshot request returned a non-OK payload");
            return Ok(Vec::new());
        }
        Ok(value
            .get("tickers")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.get("ticker").and_then(Value::as_str))
                    .map(|t| t.strip_prefix("X:").unwrap_or(t).to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Reduce an aggregate row to its staleness-probe fields.
pub fn price_point(row: &Value) -> Option<PricePoint> {
    let timestamp_ms = row.get("t")?.as_i64()?;
    let close = Decimal::from_f64(row.get("c")?.as_f64()?)?;
    Some(PricePoint {
        timestamp_ms,
        close,
    })
}
