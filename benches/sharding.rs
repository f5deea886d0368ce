//! Shard writing and full-store scans.
//!
//! ```text
//! cargo bench --bench sharding
//! ```

use std::hint::black_box;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use prescribing_store::query::{top_postcodes_by_spend, OrganizationIndex};
use prescribing_store::store::{ShardStore, ShardWriter};
use prescribing_store::types::{OrganizationRecord, TransactionRecord};
use prescribing_store::PipelineError;

const ROWS: usize = 20_000;

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("prescribing-store-bench-{name}-{nanos}"))
}

fn transactions(n: usize) -> Vec<TransactionRecord> {
    (0..n)
        .map(|i| TransactionRecord {
            hash: format!("h{i}"),
            organization_unit: format!("pct{}", i % 13),
            organization_id: format!("P{}", i % 500),
            code: "0407010H0AAAMAM".to_string(),
            description: if i % 3 == 0 { "Peppermint Oil" } else { "Paracetamol 500mg" }.to_string(),
            item_count: (i % 17) as u64,
            net_cost: (i % 101) as f64 * 1.25,
            actual_cost: (i % 101) as f64 * 1.2,
            period: "202001".to_string(),
        })
        .collect()
}

fn organizations(n: usize) -> OrganizationIndex {
    OrganizationIndex::from_records((0..n).map(|i| OrganizationRecord {
        index: i.to_string(),
        id: format!("P{i}"),
        name: format!("Practice {i}"),
        facility: "Health Centre".to_string(),
        address1: "High Street".to_string(),
        address2: "Town".to_string(),
        region: format!("R{}", i % 10),
        postcode: format!("PC{}", i % 40),
    }))
}

fn bench_write(c: &mut Criterion) {
    let records = transactions(ROWS);
    let mut group = c.benchmark_group("shard_write");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(5));
    group.throughput(Throughput::Elements(ROWS as u64));

    for &capacity in &[1_000usize, 5_000, 50_000] {
        let dir = tmp_dir(&format!("write-{capacity}"));
        let writer = ShardWriter::new(&dir, "transactions", capacity).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, _| {
            b.iter(|| {
                let summary = writer
                    .write_all(records.iter().cloned().map(Ok::<_, PipelineError>))
                    .unwrap();
                black_box(summary.rows)
            })
        });
        let _ = std::fs::remove_dir_all(&dir);
    }
    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let dir = tmp_dir("scan");
    ShardWriter::new(&dir, "transactions", 5_000)
        .unwrap()
        .write_all(transactions(ROWS).into_iter().map(Ok::<_, PipelineError>))
        .unwrap();
    let store = ShardStore::new(&dir, "transactions");
    let index = organizations(500);

    let mut group = c.benchmark_group("store_scan");
    group.sample_size(10);
    group.throughput(Throughput::Elements(ROWS as u64));
    group.bench_function("count", |b| {
        b.iter(|| black_box(store.records().unwrap().count()))
    });
    group.bench_function("top_postcodes", |b| {
        b.iter(|| black_box(top_postcodes_by_spend(&index, store.records().unwrap(), 5).unwrap()))
    });
    group.finish();

    let _ = std::fs::remove_dir_all(&dir);
}

criterion_group!(benches, bench_write, bench_scan);
criterion_main!(benches);
