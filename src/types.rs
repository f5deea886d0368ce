//! Record model for the two source files.
//!
//! - [`OrganizationRecord`]: one row of the practice (dimension) file, header-less, 8 columns.
//! - [`TransactionRecord`]: one row of the prescribing (fact) file, 9 columns after a header line.
//!
//! Both are plain owned structs with `serde` derives so the store can write them to documents and
//! read them back unchanged.

use serde::{Deserialize, Serialize};

/// Which source file a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Practice/organization reference rows.
    Organization,
    /// Prescribing transaction rows.
    Transaction,
}

impl RecordKind {
    /// Number of comma-separated fields a source line of this kind must have.
    pub fn field_count(self) -> usize {
        match self {
            RecordKind::Organization => OrganizationRecord::FIELDS.len(),
            RecordKind::Transaction => TransactionRecord::FIELDS.len(),
        }
    }

    /// Whether the source file starts with a column header line.
    pub fn has_header(self) -> bool {
        matches!(self, RecordKind::Transaction)
    }
}

/// An organization (practice) from the dimension file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    /// Sequence position in the source extract. Informational only.
    pub index: String,
    /// Organization code; the join key for transactions.
    pub id: String,
    pub name: String,
    pub facility: String,
    pub address1: String,
    pub address2: String,
    pub region: String,
    pub postcode: String,
}

impl OrganizationRecord {
    /// Column order of the dimension file.
    pub const FIELDS: [&'static str; 8] = [
        "index", "id", "name", "facility", "address1", "address2", "region", "postcode",
    ];
}

/// A prescribing transaction from the fact file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    /// Upstream grouping code. Carried through the store, not used by any report.
    pub organization_unit: String,
    /// Foreign key into [`OrganizationRecord::id`]; may not resolve.
    pub organization_id: String,
    pub code: String,
    pub description: String,
    pub item_count: u64,
    pub net_cost: f64,
    pub actual_cost: f64,
    pub period: String,
}

impl TransactionRecord {
    /// Column order of the fact file.
    pub const FIELDS: [&'static str; 9] = [
        "hash",
        "organization_unit",
        "organization_id",
        "code",
        "description",
        "item_count",
        "net_cost",
        "actual_cost",
        "period",
    ];

    /// Actual cost of a single item, or `None` when `item_count` is zero.
    pub fn cost_per_item(&self) -> Option<f64> {
        if self.item_count == 0 {
            return None;
        }
        let per_item = self.actual_cost / self.item_count as f64;
        per_item.is_finite().then_some(per_item)
    }
}
