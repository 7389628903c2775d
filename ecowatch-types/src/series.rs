//! Monthly series - the chart-ready shape of a telemetry history.

/// One calendar month's aggregation cell.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonthBucket {
    /// Calendar year.
    pub year: i32,
    /// Zero-based month (0 = January, 11 = December).
    pub month: u32,
    /// Short month name used as the chart label.
    pub label: String,
    /// Running sum of the normalized values that fell in this month.
    pub sum: f64,
}

impl MonthBucket {
    /// Create an empty bucket.
    pub fn new(year: i32, month: u32, label: impl Into<String>) -> Self {
        Self {
            year,
            month,
            label: label.into(),
            sum: 0.0,
        }
    }

    /// The `(year, month)` ordering key.
    pub fn key(&self) -> (i32, u32) {
        (self.year, self.month)
    }
}

/// A chronological sequence of monthly buckets, oldest first.
///
/// Produced by the monthly aggregator; consumers only read it.
///
/// # Example
///
/// ```rust
/// use ecowatch_types::{MonthBucket, MonthlySeries};
///
/// let series = MonthlySeries::new(vec![
///     MonthBucket::new(2025, 1, "Feb"),
///     MonthBucket::new(2025, 0, "Jan"),
/// ]);
///
/// assert_eq!(series.labels(), vec!["Jan", "Feb"]);
/// assert_eq!(series.values(), vec![0.0, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonthlySeries {
    buckets: Vec<MonthBucket>,
}

impl MonthlySeries {
    /// Build a series, ordering buckets ascending by `(year, month)`.
    pub fn new(mut buckets: Vec<MonthBucket>) -> Self {
        buckets.sort_by_key(MonthBucket::key);
        Self { buckets }
    }

    /// The buckets in chronological order.
    pub fn buckets(&self) -> &[MonthBucket] {
        &self.buckets
    }

    /// Chart labels, oldest first.
    pub fn labels(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.label.as_str()).collect()
    }

    /// Chart values, oldest first.
    pub fn values(&self) -> Vec<f64> {
        self.buckets.iter().map(|b| b.sum).collect()
    }

    /// Iterate over `(label, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.buckets.iter().map(|b| (b.label.as_str(), b.sum))
    }

    /// Sum of every bucket.
    pub fn total(&self) -> f64 {
        self.buckets.iter().map(|b| b.sum).sum()
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if the series has no buckets.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
