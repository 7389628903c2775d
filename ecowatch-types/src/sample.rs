//! Sample - one timestamped telemetry observation.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// A raw telemetry value as reported upstream.
///
/// ThingsBoard reports most values as strings, sometimes formatted with a
/// decimal comma. Numbers are accepted as well.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum SampleValue {
    /// A JSON number.
    Number(f64),
    /// A string, possibly locale-formatted.
    Text(String),
}

/// The raw text could not be read as a finite number.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("not a number: {raw:?}")]
pub struct ParseValueError {
    /// The offending raw value.
    pub raw: String,
}

impl SampleValue {
    /// Normalize to a finite float.
    ///
    /// The first decimal comma is replaced with a point before parsing, so
    /// `"12,5"` reads as `12.5`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ecowatch_types::SampleValue;
    ///
    /// assert_eq!(SampleValue::from("12,5").normalize(), Ok(12.5));
    /// assert!(SampleValue::from("abc").normalize().is_err());
    /// ```
    pub fn normalize(&self) -> Result<f64, ParseValueError> {
        let parsed = match self {
            SampleValue::Number(n) => Some(*n),
            SampleValue::Text(s) => s.trim().replacen(',', ".", 1).parse::<f64>().ok(),
        };

        match parsed {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(ParseValueError {
                raw: self.to_string(),
            }),
        }
    }

    /// Interpret this value as epoch milliseconds.
    ///
    /// Integral numbers and integer strings are accepted.
    pub fn as_epoch_millis(&self) -> Option<i64> {
        match self {
            SampleValue::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as i64),
            SampleValue::Number(_) => None,
            SampleValue::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }

    /// Convert an arbitrary JSON value, keeping only numbers and strings.
    #[cfg(feature = "serde")]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(SampleValue::Number),
            serde_json::Value::String(s) => Some(SampleValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleValue::Number(n) => write!(f, "{}", n),
            SampleValue::Text(s) => f.write_str(s),
        }
    }
}

// Integral numbers go back out as integers so epoch timestamps survive a
// pass through the proxy unchanged.
#[cfg(feature = "serde")]
impl serde::Serialize for SampleValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            SampleValue::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            SampleValue::Number(n) => serializer.serialize_f64(*n),
            SampleValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

#[cfg(feature = "serde")]
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

impl From<f64> for SampleValue {
    fn from(v: f64) -> Self {
        SampleValue::Number(v)
    }
}

impl From<i64> for SampleValue {
    fn from(v: i64) -> Self {
        SampleValue::Number(v as f64)
    }
}

impl From<&str> for SampleValue {
    fn from(v: &str) -> Self {
        SampleValue::Text(v.to_string())
    }
}

impl From<String> for SampleValue {
    fn from(v: String) -> Self {
        SampleValue::Text(v)
    }
}

/// One `{ts, value}` entry of a telemetry timeseries.
///
/// Both fields are optional: entries with a missing field, or a field of an
/// unusable JSON type, still deserialize and are left for the consumer to
/// skip.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Epoch milliseconds.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "lenient::deserialize",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub ts: Option<SampleValue>,

    /// Observed value.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            deserialize_with = "lenient::deserialize",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub value: Option<SampleValue>,
}

impl Sample {
    /// Create a well-formed sample.
    pub fn new(ts_ms: i64, value: impl Into<SampleValue>) -> Self {
        Self {
            ts: Some(SampleValue::from(ts_ms)),
            value: Some(value.into()),
        }
    }

    /// Epoch milliseconds, if present and integral.
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.ts.as_ref().and_then(SampleValue::as_epoch_millis)
    }
}

/// Latest value per telemetry key, as returned by the "latest timeseries"
/// endpoint. The first sample of each list is the current value.
pub type LatestValues = BTreeMap<String, Vec<Sample>>;

/// Returns the current (first) value for `key`, if any.
pub fn latest_value<'a>(values: &'a LatestValues, key: &str) -> Option<&'a SampleValue> {
    values.get(key)?.first()?.value.as_ref()
}

#[cfg(feature = "serde")]
mod lenient {
    use serde::{Deserialize, Deserializer};

    use super::SampleValue;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SampleValue>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(SampleValue::from_json))
    }
}
