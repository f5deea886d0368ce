use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{error, info};

use crate::error::{PipelineError, RowParseError};
use crate::types::RecordKind;

/// How serious a conversion event is. Ordered, so it can be compared against an alert threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    Info,
    /// A row was skipped; conversion continues.
    Warning,
    /// Conversion stopped on bad data.
    Error,
    /// Conversion stopped because a file could not be opened, written or removed.
    Critical,
}

/// Context about one conversion (one source file).
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// The source file being converted.
    pub path: PathBuf,
    /// Which record layout it follows.
    pub kind: RecordKind,
}

/// One closed output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardInfo {
    /// 1-based shard number (always 1 for the single organization document).
    pub number: u64,
    /// Where the document was written.
    pub path: PathBuf,
    /// Number of records it holds.
    pub rows: usize,
}

/// Stats reported when a conversion finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestionStats {
    /// Records written to the store.
    pub rows: u64,
    /// Malformed source rows that were skipped.
    pub skipped: u64,
    /// Output documents written.
    pub shards: u64,
}

/// Observer interface for conversion progress and outcomes.
///
/// Every method has a no-op default so implementors only override what they need.
pub trait IngestionObserver: Send + Sync {
    /// Called for each malformed source row that was skipped.
    fn on_row_skipped(&self, _ctx: &IngestionContext, _error: &RowParseError) {}

    /// Called each time an output document is closed.
    fn on_shard_written(&self, _ctx: &IngestionContext, _shard: &ShardInfo) {}

    /// Called when a conversion succeeds.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when a conversion fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &PipelineError) {}

    /// Called after `on_failure` when the severity is at or above the alert threshold.
    /// Forwards to [`Self::on_failure`] unless overridden.
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &PipelineError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Forwards every event to each wrapped observer, in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_row_skipped(&self, ctx: &IngestionContext, error: &RowParseError) {
        for o in &self.observers {
            o.on_row_skipped(ctx, error);
        }
    }

    fn on_shard_written(&self, ctx: &IngestionContext, shard: &ShardInfo) {
        for o in &self.observers {
            o.on_shard_written(ctx, shard);
        }
    }

    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &PipelineError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &PipelineError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Emits conversion events as `tracing` events.
///
/// Skipped rows are not repeated here; the converters already log each one at `warn`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_shard_written(&self, ctx: &IngestionContext, shard: &ShardInfo) {
        info!(
            kind = ?ctx.kind,
            shard = shard.number,
            rows = shard.rows,
            path = %shard.path.display(),
            "document written"
        );
    }

    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        info!(
            kind = ?ctx.kind,
            path = %ctx.path.display(),
            rows = stats.rows,
            skipped = stats.skipped,
            shards = stats.shards,
            "source converted"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &PipelineError) {
        error!(kind = ?ctx.kind, path = %ctx.path.display(), ?severity, "conversion failed: {error}");
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &PipelineError) {
        error!(
            alert = true,
            kind = ?ctx.kind,
            path = %ctx.path.display(),
            ?severity,
            "conversion failed: {error}"
        );
    }
}

/// Appends conversion events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Log to `path`, creating it on first use. A log line that cannot be written is dropped.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_row_skipped(&self, ctx: &IngestionContext, error: &RowParseError) {
        self.append_line(&format!(
            "{} skip kind={:?} path={} err={}",
            unix_ts(),
            ctx.kind,
            ctx.path.display(),
            error
        ));
    }

    fn on_shard_written(&self, ctx: &IngestionContext, shard: &ShardInfo) {
        self.append_line(&format!(
            "{} shard kind={:?} n={} rows={} path={}",
            unix_ts(),
            ctx.kind,
            shard.number,
            shard.rows,
            shard.path.display()
        ));
    }

    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.append_line(&format!(
            "{} ok kind={:?} path={} rows={} skipped={} shards={}",
            unix_ts(),
            ctx.kind,
            ctx.path.display(),
            stats.rows,
            stats.skipped,
            stats.shards
        ));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &PipelineError) {
        self.append_line(&format!(
            "{} fail severity={:?} kind={:?} path={} err={}",
            unix_ts(),
            severity,
            ctx.kind,
            ctx.path.display(),
            error
        ));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &PipelineError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} kind={:?} path={} err={}",
            unix_ts(),
            severity,
            ctx.kind,
            ctx.path.display(),
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
