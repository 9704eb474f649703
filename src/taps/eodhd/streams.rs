//! EODHD stream definitions
//!
//! All four streams iterate the configured symbols in sorted order and
//! bookmark the last processed symbol, so an interrupted run resumes
//! after it instead of starting over.

use serde_json::{json, Map, Value};
use std::io::Write;

use super::client::EodhdClient;
use crate::singer::{MessageWriter, TapState};
use crate::telemetry::records_emitted;

pub const FUNDAMENTALS_STREAM: &str = "fundamentals";
pub const DIVIDENDS_STREAM: &str = "dividends";
pub const EOD_STREAM: &str = "raw_historical_prices";
pub const OPTIONS_STREAM: &str = "options";

/// Which endpoint a stream reads and how its response unpacks into rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EodEndpoint {
    Fundamentals,
    Dividends,
    EodPrices,
    Options,
}

pub struct EodStream {
    pub name: &'static str,
    pub endpoint: EodEndpoint,
    pub key_properties: &'static [&'static str],
    pub replication_key: &'static str,
    pub state_interval: u64,
    pub schema: Value,
}

/// Symbols left to process this run.
///
/// `start_symbol` restarts mid-list (inclusive); otherwise the bookmark
/// resumes after the last processed symbol. A bookmark not present in the
/// sorted list means the symbol set changed, so the run starts over.
pub fn plan_symbols(
    sorted: &[String],
    start_symbol: Option<&str>,
    last_processed: Option<&str>,
) -> Vec<String> {
    if let Some(start) = start_symbol {
        if let Some(pos) = sorted.iter().position(|s| s == start) {
            return sorted[pos..].to_vec();
        }
    }
    match last_processed {
        Some(last) => match sorted.iter().position(|s| s == last) {
            Some(pos) => sorted[pos + 1..].to_vec(),
            None => sorted.to_vec(),
        },
        None => sorted.to_vec(),
    }
}

/// Replace upstream's `"NA"` string marker with an empty object.
fn replace_na(row: &mut Map<String, Value>) {
    for value in row.values_mut() {
        if matches!(value.as_str(), Some("NA") | Some("\"NA\"")) {
            *value = json!({});
        }
    }
}

impl EodStream {
    /// Unpack one endpoint response into record rows.
    fn records_from(&self, response: Value) -> Vec<Value> {
        match self.endpoint {
            EodEndpoint::Fundamentals => vec![response],
            EodEndpoint::Dividends | EodEndpoint::EodPrices => {
                response.as_array().cloned().unwrap_or_default()
            }
            EodEndpoint::Options => response
                .get("data")
                .and_then(Value::as_array)
                .map(|rows| {
                    rows.iter()
                        .cloned()
                        .map(|mut row| {
                            // The per-expiration contract chains are too large
                            // to index; only the summary row survives
                            if let Some(obj) = row.as_object_mut() {
                                obj.remove("options");
                            }
                            row
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Stamp the partition symbol, lift the replication key, scrub NA.
    fn post_process(&self, row: &mut Value, code: &str) {
        let Some(obj) = row.as_object_mut() else {
            return;
        };
        if self.endpoint == EodEndpoint::Fundamentals {
            let updated_at = obj
                .get("General")
                .and_then(|g| g.get("UpdatedAt"))
                .cloned()
                .unwrap_or_else(|| json!({}));
            obj.insert("UpdatedAt".to_string(), updated_at);
        }
        replace_na(obj);
        obj.insert("code".to_string(), Value::String(code.to_string()));
    }

    async fn fetch(&self, client: &EodhdClient, code: &str) -> Result<Value, crate::error::TapError> {
        match self.endpoint {
            EodEndpoint::Fundamentals => client.fundamentals(code).await,
            EodEndpoint::Dividends => client.dividends(code).await,
            EodEndpoint::EodPrices => client.eod_prices(code).await,
            EodEndpoint::Options => client.options(code).await,
        }
    }

    pub async fn sync<W: Write>(
        &self,
        client: &EodhdClient,
        symbols: &[String],
        start_symbol: Option<&str>,
        state: &mut TapState,
        out: &mut MessageWriter<W>,
    ) -> anyhow::Result<()> {
        out.write_schema_once(
            self.name,
            &self.schema,
            self.key_properties,
            Some(&[self.replication_key]),
        )?;

        let last = state
            .stream(self.name)
            .and_then(|s| s.last_symbol.clone());
        let todo = plan_symbols(symbols, start_symbol, last.as_deref());
        tracing::info!(
            stream = self.name,
            symbols = todo.len(),
            resumed_after = last.as_deref().unwrap_or(""),
            "starting sync"
        );

        let mut emitted = 0u64;
        for code in &todo {
            match self.fetch(client, code).await {
                Ok(response) => {
                    for mut row in self.records_from(response) {
                        self.post_process(&mut row, code);
                        out.write_record(self.name, row)?;
                        emitted += 1;
                    }
                }
                Err(e) => {
                    tracing::error!(stream = self.name, symbol = %code, error = %e, "request failed");
                }
            }
            // The cursor advances even on failure; the run must not wedge
            // on a permanently broken symbol
            state.stream_mut(self.name).last_symbol = Some(code.clone());
            out.checkpoint(state, self.state_interval)?;
        }

        records_emitted(self.name, emitted);
        tracing::info!(stream = self.name, records = emitted, "sync finished");
        Ok(())
    }
}
