//! Monthly aggregation of raw telemetry.
//!
//! Raw samples arrive irregularly timed and locale-formatted. They are
//! folded into exactly [`MONTHS_PER_SERIES`] calendar-month buckets ending
//! with the month of a reference instant, in that instant's time zone.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ecowatch_types::{HistoryWindow, MonthBucket, MonthlySeries, Sample, MONTHS_PER_SERIES};

const EN_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const PT_BR_MONTHS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Language of the month labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MonthLocale {
    /// English (`Jan`, `Feb`, ...).
    #[default]
    #[serde(rename = "en")]
    En,
    /// Brazilian Portuguese (`jan`, `fev`, ...).
    #[serde(rename = "pt-BR", alias = "pt")]
    PtBr,
}

impl MonthLocale {
    /// Short name of a zero-based month.
    pub fn short_name(&self, month0: u32) -> &'static str {
        let names = match self {
            MonthLocale::En => &EN_MONTHS,
            MonthLocale::PtBr => &PT_BR_MONTHS,
        };
        names[month0 as usize % 12]
    }
}

impl fmt::Display for MonthLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthLocale::En => write!(f, "en"),
            MonthLocale::PtBr => write!(f, "pt-BR"),
        }
    }
}

impl FromStr for MonthLocale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(MonthLocale::En),
            "pt" | "pt-br" | "pt_br" => Ok(MonthLocale::PtBr),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

/// Months since year 0, so consecutive months differ by one.
fn month_index(year: i32, month0: u32) -> i64 {
    i64::from(year) * 12 + i64::from(month0)
}

fn from_month_index(index: i64) -> (i32, u32) {
    (index.div_euclid(12) as i32, index.rem_euclid(12) as u32)
}

/// The `count` `(year, month0)` keys ending with `now`'s month, oldest first.
pub fn trailing_months<Tz: TimeZone>(now: &DateTime<Tz>, count: usize) -> Vec<(i32, u32)> {
    let last = month_index(now.year(), now.month0());
    let first = last - count as i64 + 1;
    (first..=last).map(from_month_index).collect()
}

/// Fold `samples` into 12 monthly buckets ending with `now`'s month.
///
/// Samples are skipped, never fatal, when a field is missing, the timestamp
/// is not a valid instant, or the instant falls outside the 12 months
/// (future-dated samples included). Values that do not parse contribute
/// zero.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use ecowatch::data::{aggregate_monthly, MonthLocale};
/// use ecowatch_types::Sample;
///
/// let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
/// let june = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap().timestamp_millis();
///
/// let series = aggregate_monthly(
///     &[Sample::new(june, "100"), Sample::new(june, "50,5")],
///     &now,
///     MonthLocale::En,
/// );
///
/// assert_eq!(series.len(), 12);
/// assert_eq!(series.labels().last(), Some(&"Jun"));
/// assert_eq!(series.values().last(), Some(&150.5));
/// ```
pub fn aggregate_monthly<Tz: TimeZone>(
    samples: &[Sample],
    now: &DateTime<Tz>,
    locale: MonthLocale,
) -> MonthlySeries {
    let keys = trailing_months(now, MONTHS_PER_SERIES);
    let first = keys
        .first()
        .map(|&(year, month0)| month_index(year, month0))
        .unwrap_or_default();

    let mut buckets: Vec<MonthBucket> = keys
        .into_iter()
        .map(|(year, month0)| MonthBucket::new(year, month0, locale.short_name(month0)))
        .collect();

    let tz = now.timezone();
    for (i, sample) in samples.iter().enumerate() {
        let (Some(ts), Some(value)) = (&sample.ts, &sample.value) else {
            warn!("Skipping malformed sample #{}: {:?}", i, sample);
            continue;
        };

        let Some(instant) = sample
            .timestamp_ms()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
        else {
            warn!("Skipping sample #{} with invalid timestamp {}", i, ts);
            continue;
        };

        let local = instant.with_timezone(&tz);
        let offset = month_index(local.year(), local.month0()) - first;
        let Some(bucket) = usize::try_from(offset).ok().and_then(|o| buckets.get_mut(o)) else {
            debug!("Sample #{} at {} is outside the window", i, instant);
            continue;
        };

        bucket.sum += match value.normalize() {
            Ok(v) => v,
            Err(e) => {
                warn!("Sample #{} counts as 0: {}", i, e);
                0.0
            }
        };
    }

    MonthlySeries::new(buckets)
}

/// The query window covering the `months` calendar months ending with
/// `now`'s month: from the first day of the oldest month at midnight to the
/// last millisecond of the current month, in `now`'s time zone.
///
/// Returns `None` only for dates chrono cannot represent.
pub fn trailing_window<Tz: TimeZone>(now: &DateTime<Tz>, months: u32) -> Option<HistoryWindow> {
    let last = month_index(now.year(), now.month0());
    let first = last - i64::from(months.max(1)) + 1;

    let tz = now.timezone();
    let start = month_start(&tz, first)?;
    let end = month_start(&tz, last + 1)? - 1;

    HistoryWindow::new(start, end).ok()
}

/// Epoch millis of midnight on the first day of a month.
fn month_start<Tz: TimeZone>(tz: &Tz, index: i64) -> Option<i64> {
    let (year, month0) = from_month_index(index);
    let midnight = NaiveDate::from_ymd_opt(year, month0 + 1, 1)?.and_time(NaiveTime::MIN);
    Some(local_instant(tz, midnight))
}

/// Resolve a wall-clock time, stepping past a DST gap when midnight does
/// not exist.
fn local_instant<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> i64 {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}
