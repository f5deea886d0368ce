//! Source file → document store conversion.
//!
//! - [`convert_organizations`] reads the whole (small) dimension file and writes it as a single
//!   document.
//! - [`convert_transactions`] streams the fact file through a [`ShardWriter`], never holding more
//!   than one shard's worth of records.
//!
//! Malformed rows are skipped and counted. When an [`IngestionObserver`] is configured it receives
//! every skipped row, every closed document, and the final success/failure (plus `on_alert` when
//! the failure severity is at or above [`IngestionOptions::alert_at_or_above`]).

use std::cell::Cell;
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult, RowParseError};
use crate::store::{write_document, ShardWriter};
use crate::types::{OrganizationRecord, RecordKind, TransactionRecord};

use super::observability::{
    IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats, ShardInfo,
};
use super::source::SourceRows;

/// Where conversion events go. The default has no observer and alerts only on `Critical`.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Optional observer for progress, skipped rows, and alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Failures at or above this severity also trigger `on_alert`.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Result of converting one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub stats: IngestionStats,
    /// Documents written, in write order.
    pub documents: Vec<ShardInfo>,
}

/// Convert the dimension file at `source` into one organization document at `target`.
pub fn convert_organizations(
    source: impl AsRef<Path>,
    target: impl AsRef<Path>,
    options: &IngestionOptions,
) -> PipelineResult<ConversionSummary> {
    let source = source.as_ref();
    let target = target.as_ref();
    let ctx = IngestionContext {
        path: source.to_path_buf(),
        kind: RecordKind::Organization,
    };

    let result = (|| -> PipelineResult<ConversionSummary> {
        let skipped = Cell::new(0_u64);
        let records: Vec<OrganizationRecord> = SourceRows::<OrganizationRecord, File>::from_path(source)?
            .skip_malformed(|err| {
                skipped.set(skipped.get() + 1);
                notify_skip(options, &ctx, &err);
            })
            .collect::<PipelineResult<_>>()?;

        write_document(target, RecordKind::Organization, None, &records)?;
        let document = ShardInfo {
            number: 1,
            path: target.to_path_buf(),
            rows: records.len(),
        };
        if let Some(obs) = options.observer.as_ref() {
            obs.on_shard_written(&ctx, &document);
        }

        Ok(ConversionSummary {
            stats: IngestionStats {
                rows: records.len() as u64,
                skipped: skipped.get(),
                shards: 1,
            },
            documents: vec![document],
        })
    })();

    report_outcome(options, &ctx, &result);
    result
}

/// Stream the fact file at `source` into shards via `writer`.
pub fn convert_transactions(
    source: impl AsRef<Path>,
    writer: &ShardWriter,
    options: &IngestionOptions,
) -> PipelineResult<ConversionSummary> {
    let source = source.as_ref();
    let ctx = IngestionContext {
        path: source.to_path_buf(),
        kind: RecordKind::Transaction,
    };

    let result = (|| -> PipelineResult<ConversionSummary> {
        let skipped = Cell::new(0_u64);
        let rows = SourceRows::<TransactionRecord, File>::from_path(source)?.skip_malformed(|err| {
            skipped.set(skipped.get() + 1);
            notify_skip(options, &ctx, &err);
        });

        let summary = writer.write_all_with(rows, |shard| {
            if let Some(obs) = options.observer.as_ref() {
                obs.on_shard_written(&ctx, shard);
            }
        })?;

        Ok(ConversionSummary {
            stats: IngestionStats {
                rows: summary.rows,
                skipped: skipped.get(),
                shards: summary.shards.len() as u64,
            },
            documents: summary.shards,
        })
    })();

    report_outcome(options, &ctx, &result);
    result
}

fn notify_skip(options: &IngestionOptions, ctx: &IngestionContext, err: &RowParseError) {
    warn!(kind = ?ctx.kind, path = %ctx.path.display(), line = err.line, "skipping row: {err}");
    if let Some(obs) = options.observer.as_ref() {
        obs.on_row_skipped(ctx, err);
    }
}

fn report_outcome(
    options: &IngestionOptions,
    ctx: &IngestionContext,
    result: &PipelineResult<ConversionSummary>,
) {
    match result {
        Ok(summary) => info!(
            kind = ?ctx.kind,
            rows = summary.stats.rows,
            skipped = summary.stats.skipped,
            documents = summary.stats.shards,
            "conversion finished"
        ),
        Err(e) => debug!(kind = ?ctx.kind, "conversion aborted: {e}"),
    }

    let Some(obs) = options.observer.as_ref() else {
        return;
    };
    match result {
        Ok(summary) => obs.on_success(ctx, summary.stats),
        Err(e) => report_failure(obs.as_ref(), options.alert_at_or_above, ctx, e),
    }
}

fn report_failure(
    obs: &dyn IngestionObserver,
    alert_at_or_above: IngestionSeverity,
    ctx: &IngestionContext,
    e: &PipelineError,
) {
    let sev = e.severity();
    obs.on_failure(ctx, sev, e);
    if sev >= alert_at_or_above {
        obs.on_alert(ctx, sev, e);
    }
}
