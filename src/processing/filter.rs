//! Description predicates for transaction records.

use crate::types::TransactionRecord;

/// Case-insensitive match on [`TransactionRecord::description`].
///
/// Needles are lowercased once, at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionFilter {
    /// Whole description equals the target, ignoring case.
    Equals(String),
    /// Description contains `include` and does not contain `exclude`, ignoring case.
    ContainsExcluding { include: String, exclude: String },
}

impl DescriptionFilter {
    pub fn equals(target: &str) -> Self {
        Self::Equals(target.to_lowercase())
    }

    pub fn contains_excluding(include: &str, exclude: &str) -> Self {
        Self::ContainsExcluding {
            include: include.to_lowercase(),
            exclude: exclude.to_lowercase(),
        }
    }

    pub fn matches(&self, description: &str) -> bool {
        let description = description.to_lowercase();
        match self {
            Self::Equals(target) => description == *target,
            Self::ContainsExcluding { include, exclude } => {
                description.contains(include.as_str())
                    && (exclude.is_empty() || !description.contains(exclude.as_str()))
            }
        }
    }

    pub fn matches_record(&self, record: &TransactionRecord) -> bool {
        self.matches(&record.description)
    }
}

/// Returns the records for which `predicate` is `true`, preserving order.
///
/// Errors pass through untouched so a failing store scan still surfaces.
pub fn filter<I, F>(records: I, mut predicate: F) -> impl Iterator<Item = I::Item>
where
    I: IntoIterator<Item = crate::error::PipelineResult<TransactionRecord>>,
    F: FnMut(&TransactionRecord) -> bool,
{
    records.into_iter().filter(move |item| match item {
        Ok(record) => predicate(record),
        Err(_) => true,
    })
}
