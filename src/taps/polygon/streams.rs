//! Polygon stream definitions and sync loops

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashSet;
use std::io::Write;

use super::client::{price_point, PolygonClient};
use crate::singer::{MessageWriter, PartitionState, StreamState, TapState};
use crate::sync::{
    classify_first_record, plan_fetch, today_utc, utc_date_of_ms, FetchPlan, Freshness, Shard,
};
use crate::telemetry::{record_fetch_planned, records_emitted};

/// Upcoming market status; no partition dimension, so it runs on the
/// leader shard only.
pub struct MarketStatusStream {
    pub schema: Value,
}

pub const MARKET_STATUS_STREAM: &str = "polygon_marketstatus_upcoming";
pub const MARKET_STATUS_KEYS: &[&str] = &["date", "exchange"];

impl MarketStatusStream {
    pub async fn sync<W: Write>(
        &self,
        client: &PolygonClient,
        shard: &Shard,
        state: &TapState,
        out: &mut MessageWriter<W>,
    ) -> anyhow::Result<()> {
        if !shard.is_leader() {
            tracing::debug!(
                shard = shard.id(),
                "skipping unpartitioned stream on non-leader shard"
            );
            return Ok(());
        }

        out.write_schema_once(MARKET_STATUS_STREAM, &self.schema, MARKET_STATUS_KEYS, None)?;

        let rows = match client.market_status_upcoming().await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(stream = MARKET_STATUS_STREAM, error = %e, "request failed");
                return Ok(());
            }
        };

        let mut emitted = 0u64;
        for row in rows {
            out.write_record(MARKET_STATUS_STREAM, row)?;
            emitted += 1;
            out.checkpoint(state, 100)?;
        }
        records_emitted(MARKET_STATUS_STREAM, emitted);
        Ok(())
    }
}

/// One family of daily-aggregate price streams (stocks, options, crypto)
pub struct AggsStream {
    pub name: &'static str,
    /// Field injected into every record and used as the partition key
    pub id_field: &'static str,
    /// Market prefix prepended to the key when building ticker paths
    pub ticker_prefix: &'static str,
    /// Earliest date a full refetch reaches back to
    pub epoch: NaiveDate,
    /// Absolute close-price tolerance for the staleness probe
    pub tolerance: Decimal,
    /// Snapshot endpoint for symbol discovery, if the market has one
    pub snapshot_path: Option<&'static str>,
    /// Symbols pinned in the config
    pub config_symbols: Vec<String>,
    pub schema: Value,
}

impl AggsStream {
    pub fn key_properties(&self) -> [&'static str; 2] {
        ["t", self.id_field]
    }

    fn ticker(&self, key: &str) -> String {
        format!("{}{}", self.ticker_prefix, key)
    }

    /// Assemble the partition key list for this run: bookmarked symbols
    /// first (so incremental work continues), then discovered, then
    /// configured. Deduplicated, and shard membership applies to every
    /// source so cooperating workers neither overlap nor leave gaps.
    pub fn partition_keys(
        &self,
        stream_state: Option<&StreamState>,
        discovered: Vec<String>,
        shard: &Shard,
    ) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut keys = Vec::new();

        let bookmarked = stream_state
            .map(|s| s.partitions.iter().map(|p| p.key.clone()).collect())
            .unwrap_or_else(Vec::new);

        for key in bookmarked
            .into_iter()
            .chain(discovered)
            .chain(self.config_symbols.iter().map(|s| s.trim().to_string()))
        {
            if key.is_empty() || !seen.insert(key.clone()) {
                continue;
            }
            if shard.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Probe the remembered first bar and choose the fetch window.
    async fn plan_partition(
        &self,
        client: &PolygonClient,
        key: &str,
        prior: Option<&PartitionState>,
    ) -> FetchPlan {
        let freshness = match prior.and_then(|p| p.first_record.as_ref()) {
            Some(first) => match utc_date_of_ms(first.timestamp_ms) {
                Some(date) => match client.bar_at(&self.ticker(key), date).await {
                    Ok(probe) => Some(classify_first_record(first, probe.as_ref(), self.tolerance)),
                    Err(e) => {
                        tracing::warn!(
                            stream = self.name,
                            symbol = key,
                            error = %e,
                            "first-record probe failed; treating series as revised"
                        );
                        Some(Freshness::Revised)
                    }
                },
                None => Some(Freshness::Revised),
            },
            None => None,
        };

        let plan = plan_fetch(prior, freshness, self.epoch);
        record_fetch_planned(self.name, if plan.is_full() { "full" } else { "incremental" });
        plan
    }

    /// Sync one partition: fetch its window, emit rows, advance the
    /// bookmark. Request failures are logged and leave the bookmark
    /// untouched so the next run retries the same window.
    async fn sync_partition<W: Write>(
        &self,
        client: &PolygonClient,
        key: &str,
        state: &mut TapState,
        out: &mut MessageWriter<W>,
        today: NaiveDate,
    ) -> anyhow::Result<u64> {
        let prior = state
            .stream(self.name)
            .and_then(|s| s.partition(key))
            .cloned();

        let plan = self.plan_partition(client, key, prior.as_ref()).await;

        let rows = match client
            .aggs_daily(&self.ticker(key), plan.date_from(), today)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(
                    stream = self.name,
                    symbol = key,
                    error = %e,
                    "request failed; keeping previous bookmark"
                );
                return Ok(0);
            }
        };

        let first_record = if plan.is_full() {
            rows.first()
                .and_then(price_point)
                .map(|p| crate::singer::FirstRecord {
                    timestamp_ms: p.timestamp_ms,
                    close: p.close,
                })
        } else {
            prior.as_ref().and_then(|p| p.first_record.clone())
        };

        let mut emitted = 0u64;
        for mut row in rows {
            if let Some(obj) = row.as_object_mut() {
                obj.insert(self.id_field.to_string(), Value::String(key.to_string()));
            }
            out.write_record(self.name, row)?;
            emitted += 1;
        }

        state.stream_mut(self.name).upsert_partition(PartitionState {
            key: key.to_string(),
            date_to: Some(today),
            first_record,
        });

        Ok(emitted)
    }

    pub async fn sync<W: Write>(
        &self,
        client: &PolygonClient,
        shard: &Shard,
        state: &mut TapState,
        out: &mut MessageWriter<W>,
    ) -> anyhow::Result<()> {
        out.write_schema_once(
            self.name,
            &self.schema,
            &self.key_properties(),
            Some(&["t"]),
        )?;

        let discovered = match self.snapshot_path {
            Some(path) => match client.snapshot_tickers(path).await {
                Ok(symbols) => symbols,
                Err(e) => {
                    tracing::error!(stream = self.name, error = %e, "snapshot discovery failed");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let keys = self.partition_keys(state.stream(self.name), discovered, shard);
        tracing::info!(stream = self.name, partitions = keys.len(), "starting sync");

        let today = today_utc();
        let mut emitted = 0u64;
        for key in &keys {
            emitted += self.sync_partition(client, key, state, out, today).await?;
            out.checkpoint(state, 1000)?;
        }

        records_emitted(self.name, emitted);
        tracing::info!(stream = self.name, records = emitted, "sync finished");
        Ok(())
    }
}
