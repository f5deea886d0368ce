//! Run settings.
//!
//! [`PipelineConfig`] carries everything the conversion and report passes need. Every field has a
//! default, so a settings file only has to name what it changes:
//!
//! ```json
//! {"fact_path": "/data/T201001PDPI+BNFT.csv", "shard_capacity": 20000}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IoAction, PipelineError, PipelineResult};

/// Default number of transaction records per shard.
pub const DEFAULT_SHARD_CAPACITY: usize = 50_000;

/// Parameters of the five report queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Exact (case-insensitive) description averaged by the cost-per-item report.
    pub average_description: String,
    /// Substring a description must contain for the regional price report.
    pub region_include: String,
    /// Substring that disqualifies a description from the regional price report.
    pub region_exclude: String,
    /// How many postcodes the spend ranking keeps.
    pub top_postcodes: usize,
    /// How many organizations the low-volume ranking keeps.
    pub bottom_organizations: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            average_description: "Peppermint Oil".to_string(),
            region_include: "Flucloxacillin".to_string(),
            region_exclude: "Co-Fluampicil".to_string(),
            top_postcodes: 5,
            bottom_organizations: 10,
        }
    }
}

/// Paths and sizes for one conversion + report run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Header-less organization (practice) CSV.
    pub dimension_path: PathBuf,
    /// Prescribing CSV with one header line.
    pub fact_path: PathBuf,
    /// Root of everything the run writes.
    pub output_dir: PathBuf,
    /// Organization document name, relative to `output_dir`.
    pub organizations_file: String,
    /// Shard directory, relative to `output_dir`.
    pub shard_dir: String,
    /// Shard file prefix; shards are `{shard_base_name}{n}.json`.
    pub shard_base_name: String,
    /// Maximum records per shard.
    pub shard_capacity: usize,
    /// Regional price report name, relative to `output_dir`.
    pub report_file: String,
    pub queries: QueryOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dimension_path: PathBuf::from("data").join("add.csv"),
            fact_path: PathBuf::from("data").join("pdp.csv"),
            output_dir: PathBuf::from("store"),
            organizations_file: "organizations.json".to_string(),
            shard_dir: "transactions".to_string(),
            shard_base_name: "transactions".to_string(),
            shard_capacity: DEFAULT_SHARD_CAPACITY,
            report_file: "avg-price.txt".to_string(),
            queries: QueryOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn from_json_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| PipelineError::io(IoAction::Read, path, e))?;
        Self::from_json_str(&text).map_err(|e| match e {
            PipelineError::Config { message } => PipelineError::Config {
                message: format!("{}: {message}", path.display()),
            },
            other => other,
        })
    }

    /// Parse settings from JSON text and validate them.
    pub fn from_json_str(text: &str) -> PipelineResult<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| PipelineError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> PipelineResult<()> {
        let fail = |message: &str| {
            Err(PipelineError::Config {
                message: message.to_string(),
            })
        };
        if self.shard_capacity == 0 {
            return fail("shard_capacity must be > 0");
        }
        if self.shard_base_name.is_empty() {
            return fail("shard_base_name must not be empty");
        }
        if self.queries.top_postcodes == 0 {
            return fail("queries.top_postcodes must be > 0");
        }
        if self.queries.bottom_organizations == 0 {
            return fail("queries.bottom_organizations must be > 0");
        }
        if self.queries.average_description.trim().is_empty() {
            return fail("queries.average_description must not be empty");
        }
        if self.queries.region_include.trim().is_empty() {
            return fail("queries.region_include must not be empty");
        }
        Ok(())
    }

    pub fn organizations_path(&self) -> PathBuf {
        self.output_dir.join(&self.organizations_file)
    }

    pub fn shard_dir_path(&self) -> PathBuf {
        self.output_dir.join(&self.shard_dir)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file)
    }
}
