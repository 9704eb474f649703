//! Sharding and refresh-planning invariants across the public API

use chrono::NaiveDate;
use fintap::singer::{FirstRecord, PartitionState};
use fintap::sync::{classify_first_record, plan_fetch, FetchPlan, Freshness, PricePoint, Shard};
use rust_decimal_macros::dec;

fn universe() -> Vec<String> {
    let mut symbols = Vec::new();
    for a in b'A'..=b'Z' {
        for b in b'A'..=b'Z' {
            for c in b'A'..=b'D' {
                symbols.push(format!("{}{}{}", a as char, b as char, c as char));
            }
        }
    }
    symbols
}

#[test]
fn workers_form_a_strict_partition() {
    let universe = universe();
    for count in 1..=12u32 {
        let shards: Vec<Shard> = (0..count)
            .map(|id| Shard::new(id, count).unwrap())
            .collect();

        let mut sizes = vec![0usize; count as usize];
        for symbol in &universe {
            let owners: Vec<usize> = shards
                .iter()
                .enumerate()
                .filter(|(_, s)| s.contains(symbol))
                .map(|(i, _)| i)
                .collect();
            assert_eq!(owners.len(), 1, "{} with count {}", symbol, count);
            sizes[owners[0]] += 1;
        }
        assert_eq!(sizes.iter().sum::<usize>(), universe.len());
    }
}

#[test]
fn shard_assignment_survives_reconstruction() {
    // The same (id, count) pair must own the same symbols in every process
    let first: Vec<String> = {
        let shard = Shard::new(3, 8).unwrap();
        universe().into_iter().filter(|s| shard.contains(s)).collect()
    };
    let second: Vec<String> = {
        let shard = Shard::new(3, 8).unwrap();
        universe().into_iter().filter(|s| shard.contains(s)).collect()
    };
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn unrevised_series_continues_incrementally() {
    let epoch = NaiveDate::from_ymd_opt(1980, 1, 1).unwrap();
    let prior = PartitionState {
        key: "AAPL".to_string(),
        date_to: NaiveDate::from_ymd_opt(2024, 6, 1),
        first_record: Some(FirstRecord {
            timestamp_ms: 315619200000,
            close: dec!(4.2675),
        }),
    };
    let probe = PricePoint {
        timestamp_ms: 315619200000,
        close: dec!(4.2675),
    };

    let freshness = classify_first_record(
        prior.first_record.as_ref().unwrap(),
        Some(&probe),
        dec!(0.001),
    );
    assert_eq!(freshness, Freshness::Unrevised);

    let plan = plan_fetch(Some(&prior), Some(freshness), epoch);
    assert_eq!(
        plan,
        FetchPlan::Incremental {
            date_from: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        }
    );
}

#[test]
fn revised_series_refetches_from_epoch() {
    let epoch = NaiveDate::from_ymd_opt(1980, 1, 1).unwrap();
    let prior = PartitionState {
        key: "AAPL".to_string(),
        date_to: NaiveDate::from_ymd_opt(2024, 6, 1),
        first_record: Some(FirstRecord {
            timestamp_ms: 315619200000,
            close: dec!(4.2675),
        }),
    };
    // Split-adjusted close no longer matches the bookmark
    let probe = PricePoint {
        timestamp_ms: 315619200000,
        close: dec!(1.0669),
    };

    let freshness = classify_first_record(
        prior.first_record.as_ref().unwrap(),
        Some(&probe),
        dec!(0.001),
    );
    let plan = plan_fetch(Some(&prior), Some(freshness), epoch);
    assert!(plan.is_full());
    assert_eq!(plan.date_from(), epoch);
}
