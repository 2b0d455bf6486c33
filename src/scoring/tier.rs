use serde::{Deserialize, Serialize};
use std::fmt;

/// Parse a decimal fraction such as `0.99` into exact hundredths.
fn hundredths(value: f64) -> Result<u8, String> {
    let scaled = value * 100.0;
    let rounded = scaled.round();
    if !(0.0..=100.0).contains(&rounded) {
        return Err(format!("{} is outside 0.00-1.00", value));
    }
    if (scaled - rounded).abs() > 1e-6 {
        return Err(format!("{} is not a multiple of 0.01", value));
    }
    Ok(rounded as u8)
}

/// A quantile level such as 0.99, stored as hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct QuantileLevel(u8);

impl QuantileLevel {
    pub const fn from_hundredths(h: u8) -> Self {
        Self(h)
    }

    pub fn hundredths(&self) -> u8 {
        self.0
    }

    pub fn as_fraction(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Scores at or above this level land in bucket `1 - q`.
    pub fn bucket(&self) -> Bucket {
        Bucket(100 - self.0)
    }

    /// Aggregate column name, e.g. `q0.99`.
    pub fn column_name(&self) -> String {
        format!("q{}", self)
    }
}

impl TryFrom<f64> for QuantileLevel {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        hundredths(value).map(Self)
    }
}

impl From<QuantileLevel> for f64 {
    fn from(level: QuantileLevel) -> Self {
        level.as_fraction()
    }
}

impl fmt::Display for QuantileLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_fraction())
    }
}

/// Percentile tier a score falls into: 0.01 is the top 1%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Bucket(u8);

impl Bucket {
    /// Assigned when a score meets no level of the ladder.
    pub const BOTTOM: Bucket = Bucket(99);

    pub const fn from_hundredths(h: u8) -> Self {
        Self(h)
    }

    pub fn hundredths(&self) -> u8 {
        self.0
    }

    pub fn as_fraction(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Whole-number percentile for report columns (0.03 -> 3).
    pub fn percent(&self) -> u8 {
        self.0
    }
}

impl TryFrom<f64> for Bucket {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        hundredths(value).map(Self)
    }
}

impl From<Bucket> for f64 {
    fn from(bucket: Bucket) -> Self {
        bucket.as_fraction()
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.as_fraction())
    }
}

/// Sample-size split that picks a quantile ladder and a points table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleSizeTier {
    Large,
    Small,
}

impl SampleSizeTier {
    /// `Large` once a test has at least `large_min` submissions.
    pub fn for_count(count: usize, large_min: usize) -> Self {
        if count >= large_min {
            SampleSizeTier::Large
        } else {
            SampleSizeTier::Small
        }
    }
}

impl fmt::Display for SampleSizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleSizeTier::Large => f.write_str("large"),
            SampleSizeTier::Small => f.write_str("small"),
        }
    }
}
