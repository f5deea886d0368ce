//! Row parsing: one delimited line in, one typed record (or a [`RowParseError`]) out.
//!
//! Rules:
//!
//! - Fields are positional; the line must have exactly [`FromRow::KIND`]'s field count.
//! - Every field is trimmed before interpretation.
//! - Numeric fields must parse and be non-negative; text fields are taken as-is (after trimming).

use crate::error::{RowParseError, RowParseErrorKind};
use crate::types::{OrganizationRecord, RecordKind, TransactionRecord};

/// A record type that can be built from the trimmed fields of one source line.
pub trait FromRow: Sized {
    /// Which source file layout this record follows.
    const KIND: RecordKind;

    /// Build a record from exactly `KIND.field_count()` fields.
    fn from_fields(fields: &[&str]) -> Result<Self, RowParseErrorKind>;
}

impl FromRow for OrganizationRecord {
    const KIND: RecordKind = RecordKind::Organization;

    fn from_fields(fields: &[&str]) -> Result<Self, RowParseErrorKind> {
        let [index, id, name, facility, address1, address2, region, postcode] =
            expect_fields::<8>(fields)?;
        Ok(Self {
            index: index.to_owned(),
            id: id.to_owned(),
            name: name.to_owned(),
            facility: facility.to_owned(),
            address1: address1.to_owned(),
            address2: address2.to_owned(),
            region: region.to_owned(),
            postcode: postcode.to_owned(),
        })
    }
}

impl FromRow for TransactionRecord {
    const KIND: RecordKind = RecordKind::Transaction;

    fn from_fields(fields: &[&str]) -> Result<Self, RowParseErrorKind> {
        let [
            hash,
            organization_unit,
            organization_id,
            code,
            description,
            item_count,
            net_cost,
            actual_cost,
            period,
        ] = expect_fields::<9>(fields)?;
        Ok(Self {
            hash: hash.to_owned(),
            organization_unit: organization_unit.to_owned(),
            organization_id: organization_id.to_owned(),
            code: code.to_owned(),
            description: description.to_owned(),
            item_count: parse_count("item_count", item_count)?,
            net_cost: parse_amount("net_cost", net_cost)?,
            actual_cost: parse_amount("actual_cost", actual_cost)?,
            period: period.to_owned(),
        })
    }
}

/// Parse an already-split CSV record.
///
/// `line` is the 1-based source line number, used only for error reporting.
pub fn parse_record<T: FromRow>(line: u64, record: &csv::StringRecord) -> Result<T, RowParseError> {
    let fields: Vec<&str> = record.iter().map(str::trim).collect();
    T::from_fields(&fields).map_err(|kind| RowParseError {
        line,
        raw: record.iter().collect::<Vec<_>>().join(","),
        kind,
    })
}

/// Parse one raw source line.
///
/// The line is split on every comma; quotes carry no meaning, so a stray `"` cannot pull later
/// lines into this record. An empty line is a field-count error.
pub fn parse_line<T: FromRow>(line: u64, raw: &str) -> Result<T, RowParseError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(raw.as_bytes());

    let mut record = csv::StringRecord::new();
    let kind = match rdr.read_record(&mut record) {
        Ok(true) => {
            return parse_record(line, &record).map_err(|mut err| {
                err.raw = raw.to_owned();
                err
            });
        }
        Ok(false) => RowParseErrorKind::FieldCount {
            expected: T::KIND.field_count(),
            found: 0,
        },
        Err(e) => split_failure(&e),
    };
    Err(RowParseError {
        line,
        raw: raw.to_owned(),
        kind,
    })
}

fn split_failure(err: &csv::Error) -> RowParseErrorKind {
    RowParseErrorKind::Unsplittable {
        message: err.to_string(),
    }
}

fn expect_fields<'a, const N: usize>(fields: &[&'a str]) -> Result<[&'a str; N], RowParseErrorKind> {
    <[&str; N]>::try_from(fields).map_err(|_| RowParseErrorKind::FieldCount {
        expected: N,
        found: fields.len(),
    })
}

fn parse_count(column: &'static str, raw: &str) -> Result<u64, RowParseErrorKind> {
    raw.parse::<u64>()
        .map_err(|e| RowParseErrorKind::InvalidNumber {
            column,
            value: raw.to_owned(),
            message: e.to_string(),
        })
}

fn parse_amount(column: &'static str, raw: &str) -> Result<f64, RowParseErrorKind> {
    let value = raw
        .parse::<f64>()
        .map_err(|e| RowParseErrorKind::InvalidNumber {
            column,
            value: raw.to_owned(),
            message: e.to_string(),
        })?;

    if !value.is_finite() || value < 0.0 {
        return Err(RowParseErrorKind::InvalidNumber {
            column,
            value: raw.to_owned(),
            message: "expected a finite, non-negative amount".to_string(),
        });
    }
    Ok(value)
}
