pub mod awards;
pub mod config;
pub mod stats;
pub mod tier;
pub mod validation;

pub use awards::{
    assign_bucket, assign_buckets, award_winners, rank_schools, record_points, SchoolStanding,
    TestWinners, WinnerList,
};
pub use config::{PointsEntry, ScoringPolicy, TierPolicy};
pub use stats::{aggregate_specs, linear_quantile, AggregateSpec, AggregateStats, TestAggregate};
pub use tier::{Bucket, QuantileLevel, SampleSizeTier};
pub use validation::validate_policy;
