//! In-memory organization index and the inner join against streamed transactions.

use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use crate::error::PipelineResult;
use crate::store::read_document;
use crate::types::{OrganizationRecord, RecordKind, TransactionRecord};

/// Organizations keyed by `id`; the small side of every join.
///
/// When the source repeats an id, the first occurrence is kept.
#[derive(Debug, Clone, Default)]
pub struct OrganizationIndex {
    by_id: HashMap<String, OrganizationRecord>,
}

impl OrganizationIndex {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = OrganizationRecord>,
    {
        let mut by_id = HashMap::new();
        for record in records {
            if by_id.contains_key(&record.id) {
                warn!(id = %record.id, "duplicate organization id; keeping the first occurrence");
                continue;
            }
            by_id.insert(record.id.clone(), record);
        }
        Self { by_id }
    }

    /// Load the whole-store organization document.
    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let records: Vec<OrganizationRecord> = read_document(path, RecordKind::Organization)?;
        Ok(Self::from_records(records))
    }

    pub fn get(&self, id: &str) -> Option<&OrganizationRecord> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of distinct organization ids.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Pair each transaction with its organization, dropping transactions whose
    /// `organization_id` is not in the index. Errors pass through.
    pub fn inner_join<I>(&self, records: I) -> InnerJoin<'_, I::IntoIter>
    where
        I: IntoIterator<Item = PipelineResult<TransactionRecord>>,
    {
        InnerJoin {
            index: self,
            records: records.into_iter(),
        }
    }
}

/// Iterator returned by [`OrganizationIndex::inner_join`].
pub struct InnerJoin<'a, I> {
    index: &'a OrganizationIndex,
    records: I,
}

impl<'a, I> Iterator for InnerJoin<'a, I>
where
    I: Iterator<Item = PipelineResult<TransactionRecord>>,
{
    type Item = PipelineResult<(TransactionRecord, &'a OrganizationRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.records.next()? {
                Ok(txn) => {
                    if let Some(org) = self.index.get(&txn.organization_id) {
                        return Some(Ok((txn, org)));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::test_support::{org, txn};

    #[test]
    fn duplicate_ids_keep_first_record() {
        let mut second = org("A", "South", "S1");
        second.name = "Second A".to_string();
        let index = OrganizationIndex::from_records(vec![org("A", "North", "N1"), second]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("A").unwrap().region, "North");
    }

    #[test]
    fn inner_join_drops_unmatched_transactions() {
        let index = OrganizationIndex::from_records(vec![org("A", "North", "N1")]);
        let records = vec![
            Ok(txn("A", "Oil", 1, 1.0)),
            Ok(txn("999", "Oil", 1, 1.0)),
            Ok(txn("A", "Oil", 2, 2.0)),
        ];
        let joined: Vec<_> = index
            .inner_join(records)
            .collect::<PipelineResult<_>>()
            .unwrap();
        assert_eq!(joined.len(), 2);
        assert!(joined.iter().all(|(t, o)| t.organization_id == o.id));
    }

    #[test]
    fn join_keys_are_exact_string_matches() {
        let index = OrganizationIndex::from_records(vec![org("A81001", "North", "N1")]);
        assert!(index.contains("A81001"));
        assert!(!index.contains("a81001"));
        assert!(!index.contains(" A81001"));
    }
}
