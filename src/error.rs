use std::path::PathBuf;

use thiserror::Error;

use crate::ingestion::observability::IngestionSeverity;

/// Convenience result type used across the crate.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Process exit code for a successful run.
pub const EXIT_OK: i32 = 0;
/// Process exit code for an unexpected failure.
pub const EXIT_UNKNOWN: i32 = 1;
/// Process exit code for unusable arguments or configuration.
pub const EXIT_BAD_ARGUMENTS: i32 = 2;
/// Process exit code when an output directory or file could not be created.
pub const EXIT_CREATE_FAILED: i32 = 3;
/// Process exit code when a source file is not on disk.
pub const EXIT_MISSING_SOURCE: i32 = 4;
/// Process exit code when a source file or stored document could not be read.
pub const EXIT_READ_FAILED: i32 = 5;

/// Which side of the filesystem an [`PipelineError::Io`] happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoAction {
    /// Opening or reading an existing file/directory.
    Read,
    /// Creating, writing, or truncating a file/directory.
    Write,
    /// Removing a file.
    Delete,
}

/// Error type returned by ingestion, storage, and query functions.
///
/// Row-level problems are modelled separately as [`RowParseError`]; the streaming readers recover
/// them locally and only wrap them here when a caller parses a single line directly.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Underlying I/O error, with the path that failed.
    #[error("io error ({action:?}) at {}: {source}", .path.display())]
    Io {
        action: IoAction,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV stream error (typically I/O while pulling records from a source file).
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// One malformed source line.
    #[error(transparent)]
    RowParse(#[from] RowParseError),

    /// A stored document or shard could not be read back.
    #[error("failed to read store document {}: {message}", .path.display())]
    StoreRead { path: PathBuf, message: String },

    /// An aggregate was requested over zero eligible records.
    #[error("no eligible records for {query}")]
    EmptyResult { query: String },

    /// A source file expected on disk does not exist.
    #[error("source file does not exist: {}", .path.display())]
    MissingSource { path: PathBuf },

    /// Configuration is unusable.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl PipelineError {
    pub(crate) fn io(action: IoAction, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn empty(query: impl Into<String>) -> Self {
        Self::EmptyResult {
            query: query.into(),
        }
    }

    /// Process exit code the calling shell sees for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Io {
                action: IoAction::Read,
                ..
            } => EXIT_READ_FAILED,
            PipelineError::Io { .. } => EXIT_CREATE_FAILED,
            PipelineError::Csv(_) | PipelineError::RowParse(_) | PipelineError::StoreRead { .. } => {
                EXIT_READ_FAILED
            }
            PipelineError::MissingSource { .. } => EXIT_MISSING_SOURCE,
            PipelineError::Config { .. } => EXIT_BAD_ARGUMENTS,
            PipelineError::EmptyResult { .. } => EXIT_UNKNOWN,
        }
    }

    /// Severity used when reporting this error to an observer.
    pub fn severity(&self) -> IngestionSeverity {
        match self {
            PipelineError::Io { .. } | PipelineError::MissingSource { .. } => {
                IngestionSeverity::Critical
            }
            PipelineError::Csv(err) => match err.kind() {
                csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
                _ => IngestionSeverity::Error,
            },
            PipelineError::RowParse(_) => IngestionSeverity::Warning,
            PipelineError::StoreRead { .. }
            | PipelineError::EmptyResult { .. }
            | PipelineError::Config { .. } => IngestionSeverity::Error,
        }
    }
}

/// A single source line that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("malformed row at line {line}: {kind} (raw='{raw}')")]
pub struct RowParseError {
    /// 1-based line number in the source file (header included).
    pub line: u64,
    /// The offending line, fields re-joined with commas.
    pub raw: String,
    /// What was wrong with it.
    pub kind: RowParseErrorKind,
}

/// Reason a row was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowParseErrorKind {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("column '{column}' value '{value}' is not a valid number: {message}")]
    InvalidNumber {
        column: &'static str,
        value: String,
        message: String,
    },

    #[error("line could not be split into fields: {message}")]
    Unsplittable { message: String },
}
