use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use prescribing_store::error::RowParseError;
use prescribing_store::ingestion::{
    convert_organizations, convert_transactions, CompositeObserver, FileObserver, IngestionContext,
    IngestionObserver, IngestionOptions, IngestionSeverity, IngestionStats, ShardInfo,
};
use prescribing_store::store::ShardWriter;
use prescribing_store::types::RecordKind;
use prescribing_store::PipelineError;
use tracing_subscriber::fmt::MakeWriter;

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("prescribing-store-{name}-{nanos}"))
}

#[derive(Default)]
struct RecordingObserver {
    skipped: Mutex<Vec<u64>>,
    shards: Mutex<Vec<(u64, usize)>>,
    successes: Mutex<Vec<(RecordKind, IngestionStats)>>,
    failures: Mutex<Vec<IngestionSeverity>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_row_skipped(&self, _ctx: &IngestionContext, error: &RowParseError) {
        self.skipped.lock().unwrap().push(error.line);
    }

    fn on_shard_written(&self, _ctx: &IngestionContext, shard: &ShardInfo) {
        self.shards.lock().unwrap().push((shard.number, shard.rows));
    }

    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.successes.lock().unwrap().push((ctx.kind, stats));
    }

    fn on_failure(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &PipelineError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &PipelineError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn options(obs: &Arc<RecordingObserver>) -> IngestionOptions {
    IngestionOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Critical,
    }
}

#[test]
fn skipped_rows_and_shards_are_reported() {
    let obs = Arc::new(RecordingObserver::default());
    let dir = tmp_dir("observe-shards");
    let writer = ShardWriter::new(&dir, "transactions", 3).unwrap();

    let summary =
        convert_transactions("tests/fixtures/transactions_mixed.csv", &writer, &options(&obs))
            .unwrap();

    assert_eq!(
        summary.stats,
        IngestionStats {
            rows: 8,
            skipped: 2,
            shards: 3
        }
    );
    assert_eq!(*obs.skipped.lock().unwrap(), vec![4, 6]);
    assert_eq!(*obs.shards.lock().unwrap(), vec![(1, 3), (2, 3), (3, 2)]);
    assert_eq!(
        *obs.successes.lock().unwrap(),
        vec![(RecordKind::Transaction, summary.stats)]
    );
    assert!(obs.failures.lock().unwrap().is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn organization_conversion_writes_one_document() {
    let obs = Arc::new(RecordingObserver::default());
    let dir = tmp_dir("observe-orgs");
    std::fs::create_dir_all(&dir).unwrap();

    let summary = convert_organizations(
        "tests/fixtures/organizations_extended.csv",
        dir.join("organizations.json"),
        &options(&obs),
    )
    .unwrap();

    // The document keeps every parsed row; duplicates are resolved when the index is built.
    assert_eq!(summary.stats.rows, 5);
    assert_eq!(summary.stats.shards, 1);
    assert_eq!(summary.documents.len(), 1);
    assert_eq!(*obs.shards.lock().unwrap(), vec![(1, 5)]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_source_alerts_at_critical() {
    let obs = Arc::new(RecordingObserver::default());
    let dir = tmp_dir("observe-missing");
    let writer = ShardWriter::new(&dir, "transactions", 3).unwrap();

    let err = convert_transactions("tests/fixtures/does_not_exist.csv", &writer, &options(&obs))
        .unwrap_err();
    assert!(matches!(err, PipelineError::MissingSource { .. }));

    assert_eq!(*obs.failures.lock().unwrap(), vec![IngestionSeverity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![IngestionSeverity::Critical]);
    assert!(obs.successes.lock().unwrap().is_empty());
}

#[test]
fn unwritable_document_is_a_critical_failure() {
    let obs = Arc::new(RecordingObserver::default());
    let dir = tmp_dir("observe-unwritable");
    // A directory where the document should go makes the write fail.
    let target = dir.join("organizations.json");
    std::fs::create_dir_all(&target).unwrap();

    let err = convert_organizations("tests/fixtures/organizations.csv", &target, &options(&obs))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Io { .. }));
    assert_eq!(err.exit_code(), prescribing_store::error::EXIT_CREATE_FAILED);
    assert_eq!(*obs.failures.lock().unwrap(), vec![IngestionSeverity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![IngestionSeverity::Critical]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn skipped_rows_never_count_as_failures() {
    let obs = Arc::new(RecordingObserver::default());
    let dir = tmp_dir("observe-warnings");
    let writer = ShardWriter::new(&dir, "transactions", 100).unwrap();
    let opts = IngestionOptions {
        observer: Some(obs.clone()),
        alert_at_or_above: IngestionSeverity::Warning,
    };

    convert_transactions("tests/fixtures/transactions_mixed.csv", &writer, &opts).unwrap();
    assert_eq!(obs.skipped.lock().unwrap().len(), 2);
    assert!(obs.failures.lock().unwrap().is_empty());
    assert!(obs.alerts.lock().unwrap().is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn composite_and_file_observers_fan_out() {
    let dir = tmp_dir("observe-file");
    std::fs::create_dir_all(&dir).unwrap();
    let log_path = dir.join("ingest.log");

    let recording = Arc::new(RecordingObserver::default());
    let observers: Vec<Arc<dyn IngestionObserver>> =
        vec![recording.clone(), Arc::new(FileObserver::new(&log_path))];
    let composite = CompositeObserver::new(observers);
    let opts = IngestionOptions {
        observer: Some(Arc::new(composite)),
        alert_at_or_above: IngestionSeverity::Critical,
    };

    let writer = ShardWriter::new(dir.join("shards"), "transactions", 10).unwrap();
    convert_transactions("tests/fixtures/transactions_mixed.csv", &writer, &opts).unwrap();

    assert_eq!(recording.skipped.lock().unwrap().len(), 2);
    let log = std::fs::read_to_string(&log_path).unwrap();
    assert!(log.lines().count() >= 3);
    assert!(log.contains("line 4"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLog {
    type Writer = CapturedLog;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn skipped_rows_are_logged_without_an_observer() {
    let dir = tmp_dir("observe-none");
    let writer = ShardWriter::new(&dir, "transactions", 100).unwrap();
    let log = CapturedLog::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(log.clone())
        .with_ansi(false)
        .finish();

    let summary = tracing::subscriber::with_default(subscriber, || {
        convert_transactions(
            "tests/fixtures/transactions_mixed.csv",
            &writer,
            &IngestionOptions::default(),
        )
    })
    .unwrap();
    assert_eq!(summary.stats.skipped, 2);

    let text = String::from_utf8_lossy(&log.0.lock().unwrap()).into_owned();
    let warnings: Vec<_> = text.lines().filter(|l| l.contains("skipping row")).collect();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|l| l.contains("WARN")));
    assert!(warnings[0].contains("line 4"));

    let _ = std::fs::remove_dir_all(&dir);
}
