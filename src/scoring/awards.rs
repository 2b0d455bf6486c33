use serde::Serialize;
use std::collections::BTreeMap;

use super::config::ScoringPolicy;
use super::stats::{AggregateStats, TestAggregate};
use super::tier::{Bucket, QuantileLevel, SampleSizeTier};
use crate::record::{Subject, SubmissionRecord};
use crate::roster::{Roster, SchoolDirectory};

/// Walk `ladder` from the highest level down; the first level whose
/// threshold the score meets gives bucket `1 - q`.
pub fn assign_bucket(score: u32, aggregate: &TestAggregate, ladder: &[QuantileLevel]) -> Bucket {
    let score = f64::from(score);
    ladder
        .iter()
        .find(|level| {
            aggregate
                .quantile(**level)
                .is_some_and(|threshold| score >= threshold)
        })
        .map(QuantileLevel::bucket)
        .unwrap_or(Bucket::BOTTOM)
}

/// Tier of every test present in the statistics, resolved once.
fn tiers_by_test<F>(stats: &AggregateStats, pick: F) -> BTreeMap<Subject, SampleSizeTier>
where
    F: Fn(usize) -> SampleSizeTier,
{
    stats.iter().map(|(test, agg)| (test, pick(agg.count))).collect()
}

/// Set `quantile_bucket` on every record and reset `award_bucket` to match.
/// Returns how many records received a bucket.
pub fn assign_buckets(
    records: &mut [SubmissionRecord],
    stats: &AggregateStats,
    policy: &ScoringPolicy,
) -> usize {
    let tiers = tiers_by_test(stats, |count| policy.ladder_tier(count));
    let mut assigned = 0;
    for record in records.iter_mut() {
        let bucket = record.test.and_then(|test| {
            let aggregate = stats.get(test)?;
            let tier = tiers.get(&test)?;
            Some(assign_bucket(record.score, aggregate, &policy.tier(*tier).ladder))
        });
        record.quantile_bucket = bucket;
        record.award_bucket = bucket;
        if bucket.is_some() {
            assigned += 1;
        }
    }
    assigned
}

/// Points earned by each record, in record order.
///
/// The points table follows the record's own test count, so the same bucket
/// can be worth points on one test and nothing on another.
pub fn record_points(
    records: &[SubmissionRecord],
    stats: &AggregateStats,
    policy: &ScoringPolicy,
) -> Vec<u32> {
    let tiers = tiers_by_test(stats, |count| policy.points_tier(count));
    records
        .iter()
        .map(|record| match (record.test, record.quantile_bucket) {
            (Some(test), Some(bucket)) => tiers
                .get(&test)
                .map(|tier| policy.tier(*tier).points_for(bucket))
                .unwrap_or(0),
            _ => 0,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolStanding {
    pub school_id: u32,
    pub name: Option<String>,
    pub points: u32,
}

/// Total points per school, highest first. Ties keep ascending school order.
pub fn rank_schools(
    records: &[SubmissionRecord],
    stats: &AggregateStats,
    policy: &ScoringPolicy,
    schools: &SchoolDirectory,
) -> Vec<SchoolStanding> {
    let mut totals: BTreeMap<u32, u32> = BTreeMap::new();
    for (record, points) in records.iter().zip(record_points(records, stats, policy)) {
        *totals.entry(record.school_id).or_default() += points;
    }

    let mut standings: Vec<SchoolStanding> = totals
        .into_iter()
        .map(|(school_id, points)| SchoolStanding {
            school_id,
            name: schools.name(school_id).map(str::to_string),
            points,
        })
        .collect();
    // sort_by is stable
    standings.sort_by(|a, b| b.points.cmp(&a.points));
    standings
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinnerList {
    pub bucket: Bucket,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestWinners {
    pub test: Subject,
    pub lists: Vec<WinnerList>,
}

/// Names of students whose `award_bucket` equals each listed bucket, per test.
/// Records with no roster entry are left off the lists.
pub fn award_winners(
    records: &[SubmissionRecord],
    roster: &Roster,
    award_buckets: &[Bucket],
) -> Vec<TestWinners> {
    let mut by_test: BTreeMap<Subject, Vec<&SubmissionRecord>> = BTreeMap::new();
    for record in records {
        if let Some(test) = record.test {
            by_test.entry(test).or_default().push(record);
        }
    }

    by_test
        .into_iter()
        .map(|(test, records)| TestWinners {
            test,
            lists: award_buckets
                .iter()
                .map(|bucket| WinnerList {
                    bucket: *bucket,
                    names: records
                        .iter()
                        .filter(|r| r.award_bucket == Some(*bucket))
                        .filter_map(|r| roster.name(r.school_id, r.student_id))
                        .map(str::to_string)
                        .collect(),
                })
                .collect(),
        })
        .collect()
}
