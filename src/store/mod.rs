//! On-disk document store.
//!
//! Every document is a single JSON object:
//!
//! ```json
//! {"kind":"Transaction","shard":3,"count":2,"records":[{...},{...}]}
//! ```
//!
//! - The organization file is one whole-store document (`shard` is `null`).
//! - Transactions are split into shards `{base}{n}.json`, `n = 1, 2, …` by [`ShardWriter`] and read
//!   back lazily, one shard at a time, by [`ShardStore`].
//!
//! A document that cannot be decoded, or whose `count` disagrees with its records, is a
//! [`PipelineError::StoreRead`].

pub mod reader;
pub mod writer;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{IoAction, PipelineError, PipelineResult};
use crate::types::RecordKind;

pub use reader::{ShardStore, StoreRecords};
pub use writer::{clear_shards_by_prefix, shard_file_name, ShardWriter, ShardingSummary};

/// File extension used for every stored document.
pub const DOCUMENT_EXTENSION: &str = "json";

#[derive(Serialize)]
struct DocumentRef<'a, T> {
    kind: RecordKind,
    shard: Option<u64>,
    count: usize,
    records: &'a [T],
}

#[derive(Deserialize)]
struct Document<T> {
    kind: RecordKind,
    count: usize,
    records: Vec<T>,
}

/// Serialize `records` to a fresh document at `path`, replacing any existing file.
pub fn write_document<T: Serialize>(
    path: impl AsRef<Path>,
    kind: RecordKind,
    shard: Option<u64>,
    records: &[T],
) -> PipelineResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| PipelineError::io(IoAction::Write, path, e))?;
    let mut out = BufWriter::new(file);
    let doc = DocumentRef {
        kind,
        shard,
        count: records.len(),
        records,
    };
    serde_json::to_writer(&mut out, &doc)
        .map_err(|e| PipelineError::io(IoAction::Write, path, e.into()))?;
    out.flush()
        .map_err(|e| PipelineError::io(IoAction::Write, path, e))?;
    Ok(())
}

/// Read every record of the document at `path`.
///
/// Fails with [`PipelineError::StoreRead`] when the document is malformed or holds a different
/// record kind than `kind`.
pub fn read_document<T: DeserializeOwned>(
    path: impl AsRef<Path>,
    kind: RecordKind,
) -> PipelineResult<Vec<T>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PipelineError::io(IoAction::Read, path, e))?;
    let doc: Document<T> =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| PipelineError::StoreRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if doc.kind != kind {
        return Err(PipelineError::StoreRead {
            path: path.to_path_buf(),
            message: format!("expected {kind:?} records, found {:?}", doc.kind),
        });
    }
    if doc.count != doc.records.len() {
        return Err(PipelineError::StoreRead {
            path: path.to_path_buf(),
            message: format!(
                "document declares {} records but holds {}",
                doc.count,
                doc.records.len()
            ),
        });
    }
    Ok(doc.records)
}
