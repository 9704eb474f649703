//! Partition reconciliation: work sharding and incremental refresh
//!
//! Historical price streams keep one partition per symbol. Each run must
//! decide, per partition, between a cheap incremental fetch and a full
//! historical refetch, and must split the partition set across parallel
//! workers without overlap or gaps.

mod refresh;
mod shard;

pub use refresh::{
    classify_first_record, plan_fetch, today_utc, utc_date_of_ms, FetchPlan, Freshness, PricePoint,
};
pub use shard::Shard;
