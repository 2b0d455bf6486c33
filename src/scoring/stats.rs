use std::collections::BTreeMap;

use super::tier::QuantileLevel;
use crate::record::{Subject, SubmissionRecord};

/// Named aggregate column: output name plus the level it is computed at.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSpec {
    pub column: String,
    pub level: QuantileLevel,
}

/// Build the column specs once from the configured ladder.
pub fn aggregate_specs(ladder: &[QuantileLevel]) -> Vec<AggregateSpec> {
    ladder
        .iter()
        .map(|level| AggregateSpec {
            column: level.column_name(),
            level: *level,
        })
        .collect()
}

/// Count, max, and quantile values for one test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestAggregate {
    pub count: usize,
    pub max: u32,
    quantiles: BTreeMap<QuantileLevel, f64>,
}

impl TestAggregate {
    fn from_scores(mut scores: Vec<u32>, specs: &[AggregateSpec]) -> Self {
        scores.sort_unstable();
        let sorted: Vec<f64> = scores.iter().map(|s| f64::from(*s)).collect();
        let quantiles = specs
            .iter()
            .filter_map(|spec| {
                linear_quantile(&sorted, spec.level.as_fraction()).map(|v| (spec.level, v))
            })
            .collect();
        Self {
            count: scores.len(),
            max: scores.last().copied().unwrap_or(0),
            quantiles,
        }
    }

    /// Score value at `level`, if that level was part of the aggregate ladder.
    pub fn quantile(&self, level: QuantileLevel) -> Option<f64> {
        self.quantiles.get(&level).copied()
    }
}

/// Per-test statistics, always recomputed from the full dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateStats {
    specs: Vec<AggregateSpec>,
    tests: BTreeMap<Subject, TestAggregate>,
}

impl AggregateStats {
    /// Records whose test is still unknown are left out.
    pub fn compute(records: &[SubmissionRecord], ladder: &[QuantileLevel]) -> Self {
        let specs = aggregate_specs(ladder);
        let mut scores: BTreeMap<Subject, Vec<u32>> = BTreeMap::new();
        for record in records {
            if let Some(test) = record.test {
                scores.entry(test).or_default().push(record.score);
            }
        }
        let tests = scores
            .into_iter()
            .map(|(test, s)| (test, TestAggregate::from_scores(s, &specs)))
            .collect();
        Self { specs, tests }
    }

    pub fn get(&self, test: Subject) -> Option<&TestAggregate> {
        self.tests.get(&test)
    }

    pub fn count(&self, test: Subject) -> usize {
        self.get(test).map(|agg| agg.count).unwrap_or(0)
    }

    pub fn specs(&self) -> &[AggregateSpec] {
        &self.specs
    }

    pub fn iter(&self) -> impl Iterator<Item = (Subject, &TestAggregate)> {
        self.tests.iter().map(|(test, agg)| (*test, agg))
    }

    pub fn total_count(&self) -> usize {
        self.tests.values().map(|agg| agg.count).sum()
    }
}

/// Quantile with linear interpolation between the two nearest order statistics.
/// `sorted` must be ascending.
pub fn linear_quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
