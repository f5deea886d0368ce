use crate::error::PipelineResult;
use crate::processing::{top_n, GroupedReducer};
use crate::types::TransactionRecord;

use super::join::OrganizationIndex;

/// Total actual spend of all organizations sharing a postcode.
#[derive(Debug, Clone, PartialEq)]
pub struct PostcodeSpend {
    pub postcode: String,
    pub total_cost: f64,
}

/// The `n` postcodes with the highest summed `actual_cost`.
///
/// Only transactions whose organization is in `organizations` count. Equal totals keep the order
/// in which their postcode was first seen.
pub fn top_postcodes_by_spend<I>(
    organizations: &OrganizationIndex,
    records: I,
    n: usize,
) -> PipelineResult<Vec<PostcodeSpend>>
where
    I: IntoIterator<Item = PipelineResult<TransactionRecord>>,
{
    let mut by_postcode: GroupedReducer<String, f64> = GroupedReducer::new();
    for joined in organizations.inner_join(records) {
        let (txn, org) = joined?;
        by_postcode.push(org.postcode.clone(), txn.actual_cost);
    }

    Ok(top_n(by_postcode.into_groups(), n, |g| g.sum)
        .into_iter()
        .map(|g| PostcodeSpend {
            postcode: g.key,
            total_cost: g.sum,
        })
        .collect())
}
