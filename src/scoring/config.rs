use serde::{Deserialize, Serialize};

use super::tier::{Bucket, QuantileLevel, SampleSizeTier};

/// Scoring and validation policy.
///
/// Every threshold that used to be a process-wide constant lives here and is
/// passed explicitly to the components that need it. All fields are
/// optional in YAML; missing ones take the tournament defaults.
///
/// Example YAML:
/// ```yaml
/// policy:
///   max_school_id: 425
///   students_per_school: 12
///   ladder_large_sample_min: 100
///   small:
///     ladder: [0.98, 0.96, 0.94, 0.88, 0.75, 0.50]
///     points:
///       - { bucket: 0.02, points: 10 }
///       - { bucket: 0.50, points: 1 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringPolicy {
    /// Lowest valid school ID
    pub min_school_id: u32,

    /// Highest valid school ID
    pub max_school_id: u32,

    /// Student IDs run from 1 to this value within each school
    pub students_per_school: u32,

    /// School ID an operator enters to leave a record permanently unresolved
    pub school_skip_sentinel: u32,

    /// Student ID an operator enters to leave a record permanently unresolved
    pub student_skip_sentinel: u32,

    /// A (school, student) pair with this many records is over quota
    pub over_quota_threshold: usize,

    /// A (school, student, test) triple with this many records is a repeat
    pub repeat_test_threshold: usize,

    /// Submission count at which a test switches to the large quantile ladder
    pub ladder_large_sample_min: usize,

    /// Submission count at which a test switches to the large points table
    pub points_large_sample_min: usize,

    /// Levels computed for every test's aggregate statistics
    pub aggregate_ladder: Vec<QuantileLevel>,

    /// Ladder and points for tests with many takers
    pub large: TierPolicy,

    /// Ladder and points for tests with few takers
    pub small: TierPolicy,

    /// Buckets that get a winners list in the results phase
    pub award_buckets: Vec<Bucket>,
}

/// Quantile ladder and points table for one sample-size tier.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TierPolicy {
    /// Levels walked from highest to lowest when assigning a bucket
    pub ladder: Vec<QuantileLevel>,

    /// Points earned by each bucket; buckets not listed earn nothing
    pub points: Vec<PointsEntry>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PointsEntry {
    pub bucket: Bucket,
    pub points: u32,
}

fn levels(hundredths: &[u8]) -> Vec<QuantileLevel> {
    hundredths
        .iter()
        .map(|h| QuantileLevel::from_hundredths(*h))
        .collect()
}

fn points(table: &[(u8, u32)]) -> Vec<PointsEntry> {
    table
        .iter()
        .map(|(bucket, points)| PointsEntry {
            bucket: Bucket::from_hundredths(*bucket),
            points: *points,
        })
        .collect()
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            min_school_id: 100,
            max_school_id: 425,
            students_per_school: 12,
            school_skip_sentinel: 999,
            student_skip_sentinel: 99,
            over_quota_threshold: 3,
            repeat_test_threshold: 2,
            ladder_large_sample_min: 100,
            points_large_sample_min: 100,
            aggregate_ladder: levels(&[99, 98, 97, 96, 95, 94, 90, 88, 80, 75, 50]),
            large: TierPolicy {
                ladder: levels(&[99, 98, 97, 90, 80, 50]),
                points: points(&[(1, 10), (2, 8), (3, 6), (10, 4), (20, 2), (50, 1)]),
            },
            small: TierPolicy {
                ladder: levels(&[98, 96, 94, 88, 75, 50]),
                points: points(&[(2, 10), (4, 8), (6, 6), (12, 4), (25, 2), (50, 1)]),
            },
            award_buckets: [1, 2, 3, 10]
                .into_iter()
                .map(Bucket::from_hundredths)
                .collect(),
        }
    }
}

impl ScoringPolicy {
    pub fn tier(&self, tier: SampleSizeTier) -> &TierPolicy {
        match tier {
            SampleSizeTier::Large => &self.large,
            SampleSizeTier::Small => &self.small,
        }
    }

    pub fn ladder_tier(&self, count: usize) -> SampleSizeTier {
        SampleSizeTier::for_count(count, self.ladder_large_sample_min)
    }

    pub fn points_tier(&self, count: usize) -> SampleSizeTier {
        SampleSizeTier::for_count(count, self.points_large_sample_min)
    }

    pub fn is_valid_school(&self, school_id: u32) -> bool {
        (self.min_school_id..=self.max_school_id).contains(&school_id)
    }

    pub fn is_valid_student(&self, student_id: u32) -> bool {
        (1..=self.students_per_school).contains(&student_id)
    }

    /// True when either ID carries the operator's permanent-skip sentinel.
    pub fn is_skipped(&self, school_id: u32, student_id: u32) -> bool {
        school_id == self.school_skip_sentinel || student_id == self.student_skip_sentinel
    }
}

impl TierPolicy {
    pub fn points_for(&self, bucket: Bucket) -> u32 {
        self.points
            .iter()
            .find(|entry| entry.bucket == bucket)
            .map(|entry| entry.points)
            .unwrap_or(0)
    }
}
