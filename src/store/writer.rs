//! Chunked shard writer for transaction records.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{IoAction, PipelineError, PipelineResult};
use crate::ingestion::observability::ShardInfo;
use crate::types::{RecordKind, TransactionRecord};

use super::{write_document, DOCUMENT_EXTENSION};

/// File name of shard `number` for `base_name`, e.g. `transactions3.json`.
pub fn shard_file_name(base_name: &str, number: u64) -> String {
    format!("{base_name}{number}.{DOCUMENT_EXTENSION}")
}

/// Glob pattern matching every document in `dir` whose name starts with `prefix`.
pub(crate) fn shard_glob(dir: &Path, prefix: &str) -> String {
    let dir = glob::Pattern::escape(&dir.to_string_lossy());
    let prefix = glob::Pattern::escape(prefix);
    format!("{dir}/{prefix}*.{DOCUMENT_EXTENSION}")
}

/// Matching shard paths in `dir`, in the order the filesystem glob yields them.
pub(crate) fn list_shards(dir: &Path, prefix: &str) -> PipelineResult<Vec<PathBuf>> {
    let pattern = shard_glob(dir, prefix);
    let paths = glob::glob(&pattern).map_err(|e| PipelineError::Config {
        message: format!("invalid shard pattern '{pattern}': {e}"),
    })?;

    let mut out = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            PipelineError::io(IoAction::Read, path, e.into_error())
        })?;
        if path.is_file() {
            out.push(path);
        }
    }
    Ok(out)
}

/// Delete every shard document in `dir` whose name starts with `prefix`.
///
/// Returns how many files were removed. A missing `dir` removes nothing.
pub fn clear_shards_by_prefix(dir: impl AsRef<Path>, prefix: &str) -> PipelineResult<usize> {
    let dir = dir.as_ref();
    let shards = list_shards(dir, prefix)?;
    for path in &shards {
        fs::remove_file(path).map_err(|e| PipelineError::io(IoAction::Delete, path, e))?;
    }
    if !shards.is_empty() {
        debug!(dir = %dir.display(), prefix, removed = shards.len(), "cleared previous shards");
    }
    Ok(shards.len())
}

/// What a [`ShardWriter::write_all`] call produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShardingSummary {
    /// Every shard written, in shard-number order.
    pub shards: Vec<ShardInfo>,
    /// Total records written across all shards.
    pub rows: u64,
}

/// Splits a record stream into numbered shard documents of at most `capacity` records.
#[derive(Debug, Clone)]
pub struct ShardWriter {
    dir: PathBuf,
    base_name: String,
    capacity: usize,
}

impl ShardWriter {
    /// Create a writer for `{dir}/{base_name}{n}.json`.
    ///
    /// Fails with [`PipelineError::Config`] if `capacity` is zero or `base_name` is empty.
    pub fn new(
        dir: impl Into<PathBuf>,
        base_name: impl Into<String>,
        capacity: usize,
    ) -> PipelineResult<Self> {
        let base_name = base_name.into();
        if capacity == 0 {
            return Err(PipelineError::Config {
                message: "shard capacity must be > 0".to_string(),
            });
        }
        if base_name.is_empty() {
            return Err(PipelineError::Config {
                message: "shard base name must not be empty".to_string(),
            });
        }
        Ok(Self {
            dir: dir.into(),
            base_name,
            capacity,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Write all records; see [`Self::write_all_with`].
    pub fn write_all<I>(&self, records: I) -> PipelineResult<ShardingSummary>
    where
        I: IntoIterator<Item = PipelineResult<TransactionRecord>>,
    {
        self.write_all_with(records, |_| {})
    }

    /// Write all records, calling `on_shard` as each shard is closed.
    ///
    /// Existing shards with this base name are deleted first. The source is consumed once; a
    /// batch is flushed every `capacity` records and any remainder is flushed as the final shard.
    /// `M > 0` records produce `ceil(M / capacity)` shards; an empty source produces one empty
    /// shard. The first `Err` from `records` stops the write and is returned.
    pub fn write_all_with<I, F>(&self, records: I, mut on_shard: F) -> PipelineResult<ShardingSummary>
    where
        I: IntoIterator<Item = PipelineResult<TransactionRecord>>,
        F: FnMut(&ShardInfo),
    {
        fs::create_dir_all(&self.dir)
            .map_err(|e| PipelineError::io(IoAction::Write, &self.dir, e))?;
        clear_shards_by_prefix(&self.dir, &self.base_name)?;

        let mut summary = ShardingSummary::default();
        let mut batch: Vec<TransactionRecord> = Vec::with_capacity(self.capacity);

        for record in records {
            batch.push(record?);
            if batch.len() >= self.capacity {
                let info = self.flush(&mut batch, &mut summary)?;
                on_shard(&info);
            }
        }

        // Remainder, or the single empty shard of an empty source.
        if !batch.is_empty() || summary.shards.is_empty() {
            let info = self.flush(&mut batch, &mut summary)?;
            on_shard(&info);
        }

        Ok(summary)
    }

    fn flush(
        &self,
        batch: &mut Vec<TransactionRecord>,
        summary: &mut ShardingSummary,
    ) -> PipelineResult<ShardInfo> {
        let number = summary.shards.len() as u64 + 1;
        let path = self.dir.join(shard_file_name(&self.base_name, number));
        write_document(&path, RecordKind::Transaction, Some(number), batch.as_slice())?;

        let info = ShardInfo {
            number,
            path,
            rows: batch.len(),
        };
        summary.rows += batch.len() as u64;
        summary.shards.push(info.clone());
        batch.clear();
        Ok(info)
    }
}
