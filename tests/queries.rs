use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use prescribing_store::config::PipelineConfig;
use prescribing_store::ingestion::IngestionOptions;
use prescribing_store::pipeline::ingest;
use prescribing_store::query::{PostcodeSpend, QueryEngine, Reconciliation};
use prescribing_store::PipelineError;

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("prescribing-store-{name}-{nanos}"))
}

fn converted(name: &str, organizations: &str, transactions: &str, capacity: usize) -> PipelineConfig {
    let config = PipelineConfig {
        dimension_path: PathBuf::from("tests/fixtures").join(organizations),
        fact_path: PathBuf::from("tests/fixtures").join(transactions),
        output_dir: tmp_dir(name),
        shard_capacity: capacity,
        ..PipelineConfig::default()
    };
    ingest(&config, &IngestionOptions::default()).unwrap();
    config
}

fn scenario(name: &str) -> (PipelineConfig, QueryEngine) {
    let config = converted(name, "organizations.csv", "transactions.csv", 1);
    let engine = QueryEngine::open(&config).unwrap();
    (config, engine)
}

fn mixed(name: &str) -> (PipelineConfig, QueryEngine) {
    let config = converted(name, "organizations_extended.csv", "transactions_mixed.csv", 3);
    let engine = QueryEngine::open(&config).unwrap();
    (config, engine)
}

#[test]
fn scenario_reconciles_dimension_and_unmatched_ids() {
    let (config, engine) = scenario("q1");
    assert_eq!(
        engine.reconcile().unwrap(),
        Reconciliation {
            dimension_count: 2,
            unmatched_count: 1,
            total: 3
        }
    );
    let _ = std::fs::remove_dir_all(&config.output_dir);
}

#[test]
fn scenario_averages_cost_per_item_across_all_rows() {
    let (config, engine) = scenario("q2");
    let avg = engine.average_cost().unwrap();
    assert_eq!(avg.samples, 2);
    assert!((avg.mean - 4.5).abs() < 1e-9);
    let _ = std::fs::remove_dir_all(&config.output_dir);
}

#[test]
fn scenario_top_postcodes_only_count_joined_rows() {
    let (config, engine) = scenario("q3");
    assert_eq!(
        engine.top_postcodes().unwrap(),
        vec![PostcodeSpend {
            postcode: "N1".to_string(),
            total_cost: 12.0
        }]
    );
    let _ = std::fs::remove_dir_all(&config.output_dir);
}

#[test]
fn scenario_has_nothing_for_the_regional_report() {
    let (config, engine) = scenario("q4-empty");
    let err = engine.regional_prices().unwrap_err();
    assert!(matches!(err, PipelineError::EmptyResult { .. }));
    let _ = std::fs::remove_dir_all(&config.output_dir);
}

#[test]
fn mixed_reconciliation_counts_distinct_ids() {
    let (config, engine) = mixed("mixed-q1");
    // C appears twice in the organization file; 999 is the only unknown id.
    assert_eq!(engine.organizations().len(), 4);
    let r = engine.reconcile().unwrap();
    assert_eq!((r.dimension_count, r.unmatched_count, r.total), (4, 1, 5));
    let _ = std::fs::remove_dir_all(&config.output_dir);
}

#[test]
fn mixed_average_skips_zero_item_rows() {
    let (config, engine) = mixed("mixed-q2");
    let avg = engine.average_cost().unwrap();
    assert_eq!(avg.samples, 2);
    assert!((avg.mean - 4.5).abs() < 1e-9);
    let _ = std::fs::remove_dir_all(&config.output_dir);
}

#[test]
fn mixed_top_postcodes_rank_by_total_spend() {
    let (config, engine) = mixed("mixed-q3");
    let top = engine.top_postcodes().unwrap();
    let ranked: Vec<(&str, f64)> = top
        .iter()
        .map(|p| (p.postcode.as_str(), p.total_cost))
        .collect();
    assert_eq!(ranked, vec![("S1", 59.0), ("N1", 14.0), ("N2", 4.0)]);
    let _ = std::fs::remove_dir_all(&config.output_dir);
}

#[test]
fn mixed_regional_prices_tie_in_first_seen_order() {
    let (config, engine) = mixed("mixed-q4");
    let cmp = engine.regional_prices().unwrap();
    assert!((cmp.national_mean - 2.0).abs() < 1e-9);
    assert_eq!(
        cmp.report_lines(),
        vec![
            "South: 2 - it's 100% from national mean".to_string(),
            "North: 2 - it's 100% from national mean".to_string(),
        ]
    );
    let _ = std::fs::remove_dir_all(&config.output_dir);
}

#[test]
fn mixed_lowest_volume_ranks_ascending_with_ratio_to_mean() {
    let (config, engine) = mixed("mixed-q5");
    let vol = engine.lowest_volume().unwrap();
    assert_eq!(vol.mean_items, 5);
    let rows: Vec<(&str, &str, u64, Option<u64>)> = vol
        .organizations
        .iter()
        .map(|o| (o.id.as_str(), o.name.as_str(), o.items, o.percent_of_mean))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("C", "Org C", 1, Some(20)),
            ("A", "Org A", 4, Some(80)),
            ("B", "Org B", 4, Some(80)),
            ("D", "Org D", 11, Some(220)),
        ]
    );
    let _ = std::fs::remove_dir_all(&config.output_dir);
}

#[test]
fn results_do_not_depend_on_shard_size() {
    let small = converted("cap-1", "organizations_extended.csv", "transactions_mixed.csv", 1);
    let large = converted("cap-100", "organizations_extended.csv", "transactions_mixed.csv", 100);
    let a = QueryEngine::open(&small).unwrap();
    let b = QueryEngine::open(&large).unwrap();

    assert_eq!(a.reconcile().unwrap(), b.reconcile().unwrap());
    assert_eq!(a.top_postcodes().unwrap(), b.top_postcodes().unwrap());
    assert_eq!(a.regional_prices().unwrap(), b.regional_prices().unwrap());
    assert_eq!(a.lowest_volume().unwrap(), b.lowest_volume().unwrap());

    let _ = std::fs::remove_dir_all(&small.output_dir);
    let _ = std::fs::remove_dir_all(&large.output_dir);
}
