use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{IoAction, PipelineError, PipelineResult};
use crate::processing::{filter, mean, top_n, DescriptionFilter, GroupedReducer, ReduceOp};
use crate::types::TransactionRecord;

use super::format_amount;
use super::join::OrganizationIndex;

/// Average per-item cost in one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionalPrice {
    pub region: String,
    pub average: f64,
    /// `average / national_mean * 100`; `None` when the national mean is zero.
    pub percent_of_national: Option<f64>,
}

/// Per-region average prices, highest first, against their unweighted mean.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionalComparison {
    pub national_mean: f64,
    pub regions: Vec<RegionalPrice>,
}

impl RegionalComparison {
    /// One line per region in report order.
    pub fn report_lines(&self) -> Vec<String> {
        self.regions
            .iter()
            .map(|r| {
                let pct = r
                    .percent_of_national
                    .map(|p| format!("{}%", format_amount(p)))
                    .unwrap_or_else(|| "n/a".to_string());
                format!(
                    "{}: {} - it's {} from national mean",
                    r.region,
                    format_amount(r.average),
                    pct
                )
            })
            .collect()
    }

    /// Replace `path` with the report lines.
    pub fn write_report(&self, path: impl AsRef<Path>) -> PipelineResult<()> {
        let path = path.as_ref();
        let write_err = |e| PipelineError::io(IoAction::Write, path, e);

        let mut out = BufWriter::new(File::create(path).map_err(write_err)?);
        for line in self.report_lines() {
            writeln!(out, "{line}").map_err(write_err)?;
        }
        out.flush().map_err(write_err)
    }
}

/// Compare regional average per-item cost for transactions whose description contains `include`
/// and not `exclude` (both ignoring case).
///
/// Only joined transactions with a usable per-item cost count. Fails with
/// [`PipelineError::EmptyResult`] when no region has a sample.
pub fn regional_price_comparison<I>(
    organizations: &OrganizationIndex,
    records: I,
    include: &str,
    exclude: &str,
) -> PipelineResult<RegionalComparison>
where
    I: IntoIterator<Item = PipelineResult<TransactionRecord>>,
{
    let matcher = DescriptionFilter::contains_excluding(include, exclude);
    let matching = filter(records, |r| matcher.matches_record(r));

    let mut by_region: GroupedReducer<String, f64> = GroupedReducer::new();
    for joined in organizations.inner_join(matching) {
        let (txn, org) = joined?;
        if let Some(per_item) = txn.cost_per_item() {
            by_region.push(org.region.clone(), per_item);
        }
    }

    if by_region.is_empty() {
        return Err(PipelineError::empty(format!(
            "regional prices of '{include}' excluding '{exclude}'"
        )));
    }

    let averages: Vec<(String, f64)> = by_region
        .into_groups()
        .into_iter()
        .filter_map(|g| g.reduce(ReduceOp::Mean).map(|avg| (g.key, avg)))
        .collect();
    let national_mean = mean(averages.iter().map(|(_, avg)| *avg))
        .ok_or_else(|| PipelineError::empty("national mean of regional prices"))?;

    let regions = top_n(averages, usize::MAX, |(_, avg)| *avg)
        .into_iter()
        .map(|(region, average)| RegionalPrice {
            region,
            average,
            percent_of_national: (national_mean != 0.0)
                .then(|| average / national_mean * 100.0),
        })
        .collect();

    Ok(RegionalComparison {
        national_mean,
        regions,
    })
}
