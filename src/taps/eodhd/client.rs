//! EOD Historical Data REST client

use serde_json::Value;
use std::time::Duration;

use crate::error::TapError;
use crate::http::{RestClient, RetryPolicy};

/// Section groups requested from the fundamentals endpoint
const FUNDAMENTALS_FILTER: &str = "General,Earnings,Highlights,AnalystRatings,Technicals,Valuation,Financials,SplitsDividends,SharesStats";

pub struct EodhdClient {
    rest: RestClient,
}

impl EodhdClient {
    pub fn new(base_url: &str, api_token: &str, timeout: Duration) -> Result<Self, TapError> {
        let rest = RestClient::new(
            base_url,
            timeout,
            Some(("api_token", api_token.to_string())),
            RetryPolicy::default(),
        )?;
        Ok(Self { rest })
    }

    pub async fn fundamentals(&self, code: &str) -> Result<Value, TapError> {
        let path = format!("/fundamentals/{}", code);
        let params = [("filter", FUNDAMENTALS_FILTER.to_string())];
        self.rest.get_json("fundamentals", &path, &params).await
    }

    pub async fn dividends(&self, code: &str) -> Result<Value, TapError> {
        let path = format!("/div/{}", code);
        let params = [("fmt", "json".to_string())];
        self.rest.get_json("dividends", &path, &params).await
    }

    pub async fn eod_prices(&self, code: &str) -> Result<Value, TapError> {
        let path = format!("/eod/{}", code);
        let params = [("fmt", "json".to_string()), ("period", "d".to_string())];
        self.rest.get_json("eod", &path, &params).await
    }

    pub async fn options(&self, code: &str) -> Result<Value, TapError> {
        let path = format!("/options/{}", code);
        let params = [("fmt", "json".to_string())];
        self.rest.get_json("options", &path, &params).await
    }
}
