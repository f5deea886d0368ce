//! End-to-end run: convert both sources into the store, then answer the five report queries.
//!
//! ```no_run
//! use prescribing_store::config::PipelineConfig;
//! use prescribing_store::ingestion::IngestionOptions;
//! use prescribing_store::pipeline::{ingest, run_reports};
//!
//! # fn main() -> Result<(), prescribing_store::PipelineError> {
//! let config = PipelineConfig::default();
//! ingest(&config, &IngestionOptions::default())?;
//! println!("{}", run_reports(&config)?);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{IoAction, PipelineError, PipelineResult};
use crate::ingestion::{convert_organizations, convert_transactions, ConversionSummary, IngestionOptions};
use crate::query::{
    format_amount, AverageCost, PostcodeSpend, QueryEngine, Reconciliation, RegionalComparison,
    VolumeComparison,
};
use crate::store::{ShardStore, ShardWriter};

/// What [`ingest`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionSummary {
    pub organizations: ConversionSummary,
    pub transactions: ConversionSummary,
}

/// Create the output root and the shard directory.
pub fn ensure_output_dirs(config: &PipelineConfig) -> PipelineResult<()> {
    for dir in [config.output_dir.clone(), config.shard_dir_path()] {
        fs::create_dir_all(&dir).map_err(|e| PipelineError::io(IoAction::Write, dir, e))?;
    }
    Ok(())
}

/// Fail with [`PipelineError::MissingSource`] unless both source files exist.
pub fn verify_sources(config: &PipelineConfig) -> PipelineResult<()> {
    for path in [&config.dimension_path, &config.fact_path] {
        if !path.is_file() {
            return Err(PipelineError::MissingSource { path: path.clone() });
        }
    }
    Ok(())
}

/// Fail with [`PipelineError::MissingSource`] unless an earlier conversion left an organization
/// document and at least one transaction shard behind.
pub fn verify_store(config: &PipelineConfig) -> PipelineResult<()> {
    let path = config.organizations_path();
    if !path.is_file() {
        return Err(PipelineError::MissingSource { path });
    }
    let shards = ShardStore::new(config.shard_dir_path(), config.shard_base_name.clone());
    if shards.shard_paths()?.is_empty() {
        return Err(PipelineError::MissingSource {
            path: config.shard_dir_path(),
        });
    }
    Ok(())
}

/// Convert the dimension file into its document and the fact file into shards.
///
/// Stale shards from an earlier run are removed before the first new shard is written.
pub fn ingest(config: &PipelineConfig, options: &IngestionOptions) -> PipelineResult<IngestionSummary> {
    config.validate()?;
    verify_sources(config)?;
    ensure_output_dirs(config)?;

    info!(source = %config.dimension_path.display(), "converting organizations");
    let organizations =
        convert_organizations(&config.dimension_path, config.organizations_path(), options)?;

    info!(source = %config.fact_path.display(), "converting transactions");
    let writer = ShardWriter::new(
        config.shard_dir_path(),
        config.shard_base_name.clone(),
        config.shard_capacity,
    )?;
    let transactions = convert_transactions(&config.fact_path, &writer, options)?;

    Ok(IngestionSummary {
        organizations,
        transactions,
    })
}

/// Answers to the five report queries.
///
/// A query with nothing eligible to aggregate is `None` rather than failing the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub reconciliation: Reconciliation,
    pub average_cost: Option<AverageCost>,
    pub top_postcodes: Vec<PostcodeSpend>,
    pub regional_prices: Option<RegionalComparison>,
    pub lowest_volume: Option<VolumeComparison>,
    /// Set when the regional report file was rewritten; otherwise any old report was removed.
    pub report_written: bool,
}

/// Run Q1–Q5 in order over the finished store and write the regional price report.
pub fn run_reports(config: &PipelineConfig) -> PipelineResult<AnalysisReport> {
    let engine = QueryEngine::open(config)?;

    let reconciliation = engine.reconcile()?;
    let average_cost = allow_empty(engine.average_cost())?;
    let top_postcodes = engine.top_postcodes()?;
    let regional_prices = allow_empty(engine.regional_prices())?;

    let report_path = config.report_path();
    let report_written = match &regional_prices {
        Some(comparison) => {
            write_regional_report(comparison, &report_path)?;
            true
        }
        None => {
            remove_stale_report(&report_path)?;
            false
        }
    };

    let lowest_volume = allow_empty(engine.lowest_volume())?;

    Ok(AnalysisReport {
        reconciliation,
        average_cost,
        top_postcodes,
        regional_prices,
        lowest_volume,
        report_written,
    })
}

fn write_regional_report(comparison: &RegionalComparison, path: &Path) -> PipelineResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(IoAction::Write, parent, e))?;
    }
    comparison.write_report(path)?;
    info!(path = %path.display(), regions = comparison.regions.len(), "regional price report written");
    Ok(())
}

fn remove_stale_report(path: &Path) -> PipelineResult<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "removed stale regional price report");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::io(IoAction::Delete, path, e)),
    }
}

fn allow_empty<T>(result: PipelineResult<T>) -> PipelineResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(PipelineError::EmptyResult { query }) => {
            warn!("no eligible records for {query}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.reconciliation;
        writeln!(f, "1)")?;
        writeln!(f, "Practices count from ADD file: {}", r.dimension_count)?;
        writeln!(
            f,
            "Practices count from PDP file not mentioned in ADD: {}",
            r.unmatched_count
        )?;
        writeln!(f, "So, overall count of practices is: {}", r.total)?;

        writeln!(f, "\n2)")?;
        match &self.average_cost {
            Some(avg) => writeln!(
                f,
                "The average actual cost of all {} prescriptions: {} per item",
                avg.description,
                format_amount(avg.mean)
            )?,
            None => writeln!(f, "No prescriptions to average")?,
        }

        writeln!(f, "\n3)")?;
        writeln!(
            f,
            "Top {} postcodes with their costs (among those whose IDs are present in ADD file):",
            self.top_postcodes.len()
        )?;
        for p in &self.top_postcodes {
            writeln!(
                f,
                "- practices from \"{}\" spent {} in total",
                p.postcode,
                format_amount(p.total_cost)
            )?;
        }

        writeln!(f, "\n4)")?;
        match &self.regional_prices {
            Some(cmp) => {
                writeln!(f, "Average national mean: {}", format_amount(cmp.national_mean))?;
                for line in cmp.report_lines() {
                    writeln!(f, "{line}")?;
                }
            }
            None => writeln!(f, "No prescriptions to compare by region")?,
        }

        writeln!(f, "\n5)")?;
        match &self.lowest_volume {
            Some(vol) => {
                writeln!(f, "Overall average items of prescriptions: {}", vol.mean_items)?;
                writeln!(f, "Practices with the lowest number of prescriptions:")?;
                for o in &vol.organizations {
                    let pct = o
                        .percent_of_mean
                        .map(|p| format!("{p}%"))
                        .unwrap_or_else(|| "n/a".to_string());
                    writeln!(
                        f,
                        "- [{}] {}: {}, it's {} from average value",
                        o.id, o.name, o.items, pct
                    )?;
                }
            }
            None => writeln!(f, "No prescriptions to rank by volume")?,
        }
        Ok(())
    }
}
