//! Conversion of the delimited source files into the document store.
//!
//! Most callers should use [`convert_organizations`] and [`convert_transactions`] (from
//! [`convert`]), which:
//!
//! - stream the source through the [`parser`] one record at a time
//! - skip malformed rows without aborting, counting and reporting each one
//! - optionally report progress/failure/alerts to an [`IngestionObserver`]
//!
//! Lower-level pieces are also available:
//! - [`parser`]: one line or CSV record → typed record
//! - [`source`]: lazy record streams over a file or reader

pub mod convert;
pub mod observability;
pub mod parser;
pub mod source;

pub use convert::{convert_organizations, convert_transactions, ConversionSummary, IngestionOptions};
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity,
    IngestionStats, ShardInfo, TracingObserver,
};
pub use parser::{parse_line, parse_record, FromRow};
pub use source::{SkipMalformed, SourceRows};
