//! `prescribing-store` converts two delimited prescribing extracts into an on-disk document store
//! and answers a fixed set of aggregate questions over it.
//!
//! The inputs are:
//!
//! - an **organization** (practice) file: header-less, 8 columns, small enough to hold in memory
//! - a **transaction** (prescribing) file: one header line, then 9 columns per row, far too large
//!   to hold in memory
//!
//! Conversion writes the organizations as one JSON document and splits the transactions into
//! numbered JSON shards of at most `shard_capacity` records. Queries then stream the shards back
//! one at a time, so memory stays bounded by the organization index plus one shard.
//!
//! ## Quick example: convert, then query
//!
//! ```no_run
//! use prescribing_store::config::PipelineConfig;
//! use prescribing_store::ingestion::IngestionOptions;
//! use prescribing_store::pipeline::ingest;
//! use prescribing_store::query::QueryEngine;
//!
//! # fn main() -> Result<(), prescribing_store::PipelineError> {
//! let config = PipelineConfig::default();
//! let summary = ingest(&config, &IngestionOptions::default())?;
//! println!(
//!     "shards={} skipped={}",
//!     summary.transactions.stats.shards, summary.transactions.stats.skipped
//! );
//!
//! let engine = QueryEngine::open(&config)?;
//! let q1 = engine.reconcile()?;
//! println!("organizations overall: {}", q1.total);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: the two record kinds
//! - [`ingestion`]: CSV parsing, malformed-row skipping, conversion, observers
//! - [`store`]: document encoding, the shard writer and the lazy shard reader
//! - [`processing`]: description filters and grouped reductions
//! - [`query`]: the five report queries and [`query::QueryEngine`]
//! - [`pipeline`]: end-to-end orchestration and the rendered answers
//! - [`config`]: JSON-loadable run settings
//! - [`error`]: the crate error type and process exit codes
//!
//! ## Malformed rows
//!
//! A row with the wrong number of fields, or a numeric column that does not parse, is skipped.
//! It is counted in [`ingestion::IngestionStats::skipped`] and reported to the configured
//! [`ingestion::IngestionObserver`], and conversion carries on with the next row.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod processing;
pub mod query;
pub mod store;
pub mod types;

pub use config::{PipelineConfig, QueryOptions};
pub use error::{PipelineError, PipelineResult};
