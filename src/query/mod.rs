//! The five report queries.
//!
//! Every query takes the organization index plus any stream of `PipelineResult<TransactionRecord>`,
//! so they run the same over an in-memory `Vec` or a [`ShardStore`] scan. [`QueryEngine`] binds
//! them to one store and the configured query parameters.
//!
//! | query | function | result |
//! |---|---|---|
//! | Q1 | [`reconcile_organizations`] | [`Reconciliation`] |
//! | Q2 | [`average_cost_per_item`] | [`AverageCost`] |
//! | Q3 | [`top_postcodes_by_spend`] | `Vec<`[`PostcodeSpend`]`>` |
//! | Q4 | [`regional_price_comparison`] | [`RegionalComparison`] |
//! | Q5 | [`lowest_volume_organizations`] | [`VolumeComparison`] |

pub mod average;
pub mod join;
pub mod postcode;
pub mod reconcile;
pub mod region;
pub mod volume;

use tracing::info;

use crate::config::{PipelineConfig, QueryOptions};
use crate::error::PipelineResult;
use crate::store::ShardStore;

pub use average::{average_cost_per_item, AverageCost};
pub use join::{InnerJoin, OrganizationIndex};
pub use postcode::{top_postcodes_by_spend, PostcodeSpend};
pub use reconcile::{reconcile_organizations, Reconciliation};
pub use region::{regional_price_comparison, RegionalComparison, RegionalPrice};
pub use volume::{lowest_volume_organizations, OrganizationVolume, VolumeComparison};

/// Render an amount with at most two decimals and no trailing zeros (`4.5`, `12`, `0.33`).
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Queries bound to one organization index and one transaction store.
///
/// Each call makes a fresh pass over the shards.
#[derive(Debug)]
pub struct QueryEngine {
    organizations: OrganizationIndex,
    store: ShardStore,
    options: QueryOptions,
}

impl QueryEngine {
    pub fn new(organizations: OrganizationIndex, store: ShardStore, options: QueryOptions) -> Self {
        Self {
            organizations,
            store,
            options,
        }
    }

    /// Load the organization document and point at the shard directory named by `config`.
    pub fn open(config: &PipelineConfig) -> PipelineResult<Self> {
        let organizations = OrganizationIndex::load(config.organizations_path())?;
        let store = ShardStore::new(config.shard_dir_path(), config.shard_base_name.clone());
        info!(
            organizations = organizations.len(),
            store = %store.dir().display(),
            "query engine ready"
        );
        Ok(Self::new(organizations, store, config.queries.clone()))
    }

    pub fn organizations(&self) -> &OrganizationIndex {
        &self.organizations
    }

    pub fn store(&self) -> &ShardStore {
        &self.store
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn reconcile(&self) -> PipelineResult<Reconciliation> {
        let result = reconcile_organizations(&self.organizations, self.store.records()?)?;
        info!(
            dimension = result.dimension_count,
            unmatched = result.unmatched_count,
            total = result.total,
            "reconciled organizations"
        );
        Ok(result)
    }

    pub fn average_cost(&self) -> PipelineResult<AverageCost> {
        let result =
            average_cost_per_item(self.store.records()?, &self.options.average_description)?;
        info!(
            description = %result.description,
            mean = result.mean,
            samples = result.samples,
            "average cost per item"
        );
        Ok(result)
    }

    pub fn top_postcodes(&self) -> PipelineResult<Vec<PostcodeSpend>> {
        let result = top_postcodes_by_spend(
            &self.organizations,
            self.store.records()?,
            self.options.top_postcodes,
        )?;
        info!(postcodes = result.len(), "ranked postcodes by spend");
        Ok(result)
    }

    pub fn regional_prices(&self) -> PipelineResult<RegionalComparison> {
        let result = regional_price_comparison(
            &self.organizations,
            self.store.records()?,
            &self.options.region_include,
            &self.options.region_exclude,
        )?;
        info!(
            regions = result.regions.len(),
            national_mean = result.national_mean,
            "compared regional prices"
        );
        Ok(result)
    }

    pub fn lowest_volume(&self) -> PipelineResult<VolumeComparison> {
        let result = lowest_volume_organizations(
            &self.organizations,
            self.store.records()?,
            self.options.bottom_organizations,
        )?;
        info!(
            organizations = result.organizations.len(),
            mean_items = result.mean_items,
            "ranked organizations by item volume"
        );
        Ok(result)
    }
}
