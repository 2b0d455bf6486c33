use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::record::SubmissionRecord;

pub const DATASET_VERSION: u32 = 1;

/// Every graded submission across runs, in the order they were added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeDataset {
    pub version: u32,
    #[serde(default)]
    pub records: Vec<SubmissionRecord>,
}

impl Default for CumulativeDataset {
    fn default() -> Self {
        Self::new()
    }
}

impl CumulativeDataset {
    pub fn new() -> Self {
        Self::from_records(Vec::new())
    }

    pub fn from_records(records: Vec<SubmissionRecord>) -> Self {
        Self {
            version: DATASET_VERSION,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy ordered by test name, then score from highest to lowest. Records
    /// without a test go last and ties keep their dataset order.
    pub fn sorted_by_test_and_score(&self) -> Self {
        let mut records = self.records.clone();
        records.sort_by_key(|r| (r.test.is_none(), r.test.map(|t| t.name()), Reverse(r.score)));
        Self::from_records(records)
    }
}
