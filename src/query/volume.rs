use crate::error::{PipelineError, PipelineResult};
use crate::processing::{bottom_n, GroupedReducer};
use crate::types::TransactionRecord;

use super::join::OrganizationIndex;

/// Total items prescribed by one organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationVolume {
    pub id: String,
    pub name: String,
    pub items: u64,
    /// `items * 100 / mean_items`, truncated; `None` when the mean is zero.
    pub percent_of_mean: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeComparison {
    /// Unweighted mean of per-organization item totals, truncated.
    pub mean_items: u64,
    /// Lowest-volume organizations, ascending.
    pub organizations: Vec<OrganizationVolume>,
}

/// The `n` organizations with the fewest items, each compared to the mean across all organizations.
///
/// Fails with [`PipelineError::EmptyResult`] when no transaction joins to an organization.
pub fn lowest_volume_organizations<I>(
    organizations: &OrganizationIndex,
    records: I,
    n: usize,
) -> PipelineResult<VolumeComparison>
where
    I: IntoIterator<Item = PipelineResult<TransactionRecord>>,
{
    let mut by_org: GroupedReducer<(String, String), u64> = GroupedReducer::new();
    for joined in organizations.inner_join(records) {
        let (txn, org) = joined?;
        by_org.push((org.id.clone(), org.name.clone()), txn.item_count);
    }

    if by_org.is_empty() {
        return Err(PipelineError::empty("item volume per organization"));
    }

    let groups = by_org.into_groups();
    let total: u128 = groups.iter().map(|g| u128::from(g.sum)).sum();
    let mean_items = u64::try_from(total / groups.len() as u128).unwrap_or(u64::MAX);

    let organizations = bottom_n(groups, n, |g| g.sum)
        .into_iter()
        .map(|g| {
            let ((id, name), items) = (g.key, g.sum);
            OrganizationVolume {
                id,
                name,
                items,
                percent_of_mean: (mean_items != 0).then(|| {
                    let pct = u128::from(items) * 100 / u128::from(mean_items);
                    u64::try_from(pct).unwrap_or(u64::MAX)
                }),
            }
        })
        .collect();

    Ok(VolumeComparison {
        mean_items,
        organizations,
    })
}
