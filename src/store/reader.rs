//! Lazy reads over the sharded transaction store.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{RecordKind, TransactionRecord};

use super::read_document;
use super::writer::list_shards;
use super::DOCUMENT_EXTENSION;

/// Handle to the shards `{dir}/{base_name}*.json`.
///
/// Cheap to clone; nothing is read until [`Self::records`] is iterated.
#[derive(Debug, Clone)]
pub struct ShardStore {
    dir: PathBuf,
    base_name: String,
}

impl ShardStore {
    pub fn new(dir: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base_name: base_name.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Shard paths in filesystem listing order.
    ///
    /// That order is not guaranteed to be numeric; use [`Self::ordered_shard_paths`] when the
    /// written record sequence matters.
    pub fn shard_paths(&self) -> PipelineResult<Vec<PathBuf>> {
        list_shards(&self.dir, &self.base_name)
    }

    /// Shard paths sorted by shard number. Files whose suffix is not a number sort last.
    pub fn ordered_shard_paths(&self) -> PipelineResult<Vec<PathBuf>> {
        let mut paths = self.shard_paths()?;
        paths.sort_by_key(|p| shard_number(p, &self.base_name).unwrap_or(u64::MAX));
        Ok(paths)
    }

    /// Read one shard fully into memory.
    pub fn read_shard(&self, path: impl AsRef<Path>) -> PipelineResult<Vec<TransactionRecord>> {
        read_document(path, RecordKind::Transaction)
    }

    /// Every record in the store, loading one shard at a time in shard-number order.
    ///
    /// Each call re-lists the shard directory, so the sequence can be restarted by calling this
    /// again. A shard that fails to decode yields one `Err` and ends the sequence. A conversion
    /// always leaves at least one shard, so finding none is a [`PipelineError::StoreRead`].
    pub fn records(&self) -> PipelineResult<StoreRecords> {
        let shards = self.ordered_shard_paths()?;
        if shards.is_empty() {
            return Err(PipelineError::StoreRead {
                path: self.dir.clone(),
                message: format!("no {}N.{DOCUMENT_EXTENSION} shards found", self.base_name),
            });
        }
        debug!(dir = %self.dir.display(), shards = shards.len(), "scanning store");
        Ok(StoreRecords::new(shards))
    }
}

/// Parse the shard number out of `{base_name}{n}.json`.
pub fn shard_number(path: &Path, base_name: &str) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    name.strip_prefix(base_name)?
        .strip_suffix(DOCUMENT_EXTENSION)?
        .strip_suffix('.')?
        .parse()
        .ok()
}

/// Iterator returned by [`ShardStore::records`].
#[derive(Debug)]
pub struct StoreRecords {
    pending: std::vec::IntoIter<PathBuf>,
    current: std::vec::IntoIter<TransactionRecord>,
    failed: bool,
}

impl StoreRecords {
    fn new(shards: Vec<PathBuf>) -> Self {
        Self {
            pending: shards.into_iter(),
            current: Vec::new().into_iter(),
            failed: false,
        }
    }
}

impl Iterator for StoreRecords {
    type Item = PipelineResult<TransactionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(record) = self.current.next() {
                return Some(Ok(record));
            }
            let path = self.pending.next()?;
            match read_document::<TransactionRecord>(&path, RecordKind::Transaction) {
                Ok(records) => self.current = records.into_iter(),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
