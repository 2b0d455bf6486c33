use super::types::CumulativeDataset;
use crate::record::SubmissionRecord;

/// Whether a merge found a dataset from an earlier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Appended { existing: usize, incoming: usize },
    FirstRun { incoming: usize },
}

/// Append `incoming` after the existing records. Each side keeps its
/// relative order; nothing is deduplicated here.
pub fn merge(
    existing: Option<CumulativeDataset>,
    incoming: Vec<SubmissionRecord>,
) -> (CumulativeDataset, MergeOutcome) {
    match existing {
        Some(mut dataset) => {
            let outcome = MergeOutcome::Appended {
                existing: dataset.len(),
                incoming: incoming.len(),
            };
            dataset.records.extend(incoming);
            (dataset, outcome)
        }
        None => {
            let outcome = MergeOutcome::FirstRun {
                incoming: incoming.len(),
            };
            (CumulativeDataset::from_records(incoming), outcome)
        }
    }
}
