//! Batch aggregation of extract results

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{BatchSummary, ExtractResult};

/// Fold results into totals by material, vessel class and vessel
///
/// The fold is commutative: any permutation of `results` gives the same
/// summary up to floating-point rounding of the sums.
pub fn aggregate(results: &[ExtractResult]) -> BatchSummary {
    results.iter().fold(BatchSummary::default(), |mut summary, result| {
        summary.record(result);
        summary
    })
}

/// One summary per calendar day; results without a timestamp are skipped
pub fn daily_summaries(results: &[ExtractResult]) -> BTreeMap<NaiveDate, BatchSummary> {
    let mut days: BTreeMap<NaiveDate, BatchSummary> = BTreeMap::new();
    for result in results {
        if let Some(ts) = result.timestamp {
            days.entry(ts.date()).or_default().record(result);
        }
    }
    days
}
