use std::collections::HashSet;

use crate::error::PipelineResult;
use crate::types::TransactionRecord;

use super::join::OrganizationIndex;

/// How many organizations exist once the fact file's references are taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    /// Distinct ids in the organization file.
    pub dimension_count: usize,
    /// Distinct organization ids referenced by transactions but missing from the organization file.
    pub unmatched_count: usize,
    /// `dimension_count + unmatched_count`.
    pub total: usize,
}

/// Count organizations across both sources: `|A|`, `|B \ A|` and their sum.
pub fn reconcile_organizations<I>(
    organizations: &OrganizationIndex,
    records: I,
) -> PipelineResult<Reconciliation>
where
    I: IntoIterator<Item = PipelineResult<TransactionRecord>>,
{
    let mut unmatched: HashSet<String> = HashSet::new();
    for record in records {
        let record = record?;
        if !organizations.contains(&record.organization_id) {
            unmatched.insert(record.organization_id);
        }
    }

    let dimension_count = organizations.len();
    Ok(Reconciliation {
        dimension_count,
        unmatched_count: unmatched.len(),
        total: dimension_count + unmatched.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::query::test_support::{org, txn};

    fn index() -> OrganizationIndex {
        OrganizationIndex::from_records(vec![org("A", "North", "N1"), org("B", "South", "S1")])
    }

    #[test]
    fn counts_dimension_and_unmatched_ids() {
        let records = vec![
            Ok(txn("A", "Oil", 1, 1.0)),
            Ok(txn("999", "Oil", 1, 1.0)),
            Ok(txn("999", "Oil", 1, 1.0)),
            Ok(txn("777", "Oil", 1, 1.0)),
        ];
        let r = reconcile_organizations(&index(), records).unwrap();
        assert_eq!(
            r,
            Reconciliation {
                dimension_count: 2,
                unmatched_count: 2,
                total: 4
            }
        );
    }

    #[test]
    fn result_does_not_depend_on_row_order() {
        let rows = vec![
            txn("999", "Oil", 1, 1.0),
            txn("A", "Oil", 1, 1.0),
            txn("777", "Oil", 1, 1.0),
            txn("B", "Oil", 1, 1.0),
        ];
        let forward = reconcile_organizations(&index(), rows.clone().into_iter().map(Ok)).unwrap();
        let reversed =
            reconcile_organizations(&index(), rows.into_iter().rev().map(Ok)).unwrap();
        assert_eq!(forward, reversed);
        assert_eq!(forward.total, 4);
    }

    #[test]
    fn store_errors_propagate() {
        let records = vec![
            Ok(txn("A", "Oil", 1, 1.0)),
            Err(PipelineError::StoreRead {
                path: "t2.json".into(),
                message: "truncated".into(),
            }),
        ];
        let err = reconcile_organizations(&index(), records).unwrap_err();
        assert!(matches!(err, PipelineError::StoreRead { .. }));
    }
}
