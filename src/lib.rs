//! fintap: Singer-protocol taps for financial market APIs and a search-index target
//!
//! This library provides the core components for:
//! - Singer message codec (SCHEMA/RECORD/STATE over newline-delimited JSON)
//! - Deterministic hash-based work sharding across parallel workers
//! - First-record staleness detection for incremental price refresh
//! - Taps for Polygon, CoinGecko, and EOD Historical Data
//! - A batching target that loads records into a search index
//! - Retrying REST plumbing shared by all taps
//! - Full observability stack

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod singer;
pub mod sync;
pub mod taps;
pub mod target;
pub mod telemetry;
