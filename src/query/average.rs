use crate::error::{PipelineError, PipelineResult};
use crate::processing::{filter, DescriptionFilter};
use crate::types::TransactionRecord;

/// Mean actual cost per item across every transaction with a given description.
#[derive(Debug, Clone, PartialEq)]
pub struct AverageCost {
    pub description: String,
    pub mean: f64,
    /// Transactions that contributed (zero-item rows excluded).
    pub samples: u64,
}

/// Average `actual_cost / item_count` over transactions whose description equals `description`
/// (ignoring case).
///
/// Rows with `item_count == 0` are skipped. Fails with [`PipelineError::EmptyResult`] when no
/// row is eligible.
pub fn average_cost_per_item<I>(records: I, description: &str) -> PipelineResult<AverageCost>
where
    I: IntoIterator<Item = PipelineResult<TransactionRecord>>,
{
    let matcher = DescriptionFilter::equals(description);
    let mut sum = 0.0_f64;
    let mut samples = 0_u64;

    for record in filter(records, |r| matcher.matches_record(r)) {
        if let Some(per_item) = record?.cost_per_item() {
            sum += per_item;
            samples += 1;
        }
    }

    if samples == 0 {
        return Err(PipelineError::empty(format!(
            "average cost per item of '{description}'"
        )));
    }
    Ok(AverageCost {
        description: description.to_string(),
        mean: sum / samples as f64,
        samples,
    })
}
