//! Formatting rules for current values.
//!
//! Each telemetry key maps to a [`DisplayRule`]. Keys without a rule are
//! shown exactly as reported.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use ecowatch_types::{latest_value, LatestValues, SampleValue};

/// Shown in place of a value that should be numeric but is not.
pub const MISSING: &str = "-";

/// How a raw value is turned into display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Format {
    /// The raw text, untouched.
    #[default]
    Raw,
    /// Nearest integer, halves rounding up.
    Round,
    /// Fixed number of decimal places.
    Fixed(u8),
}

impl Format {
    /// Apply this format to a raw value.
    ///
    /// `Round` and `Fixed` need the whole value to be a number once the
    /// decimal comma is normalized. A value with a trailing unit such as
    /// `"21,5 °C"` is not read as its numeric prefix; it shows as `-`.
    ///
    /// # Example
    ///
    /// ```
    /// use ecowatch::data::Format;
    /// use ecowatch_types::SampleValue;
    ///
    /// assert_eq!(Format::Round.apply(&SampleValue::from("21,5")), "22");
    /// assert_eq!(Format::Fixed(2).apply(&SampleValue::from("3,14159")), "3.14");
    /// assert_eq!(Format::Fixed(0).apply(&SampleValue::from("n/a")), "-");
    /// assert_eq!(Format::Raw.apply(&SampleValue::from("ON")), "ON");
    /// ```
    pub fn apply(&self, raw: &SampleValue) -> String {
        match self {
            Format::Raw => raw.to_string(),
            Format::Round => raw
                .normalize()
                .map(|v| format!("{}", (v + 0.5).floor() as i64))
                .unwrap_or_else(|_| MISSING.to_string()),
            Format::Fixed(decimals) => raw
                .normalize()
                .map(|v| format!("{:.*}", usize::from(*decimals), v))
                .unwrap_or_else(|_| MISSING.to_string()),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Raw => write!(f, "raw"),
            Format::Round => write!(f, "round"),
            Format::Fixed(decimals) => write!(f, "fixed:{}", decimals),
        }
    }
}

impl FromStr for Format {
    type Err = String;

    /// Parses `raw`, `round` or `fixed:<decimals>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "raw" => Ok(Format::Raw),
            "round" => Ok(Format::Round),
            _ => s
                .strip_prefix("fixed:")
                .and_then(|d| d.trim().parse().ok())
                .map(Format::Fixed)
                .ok_or_else(|| format!("invalid display format {:?}", s)),
        }
    }
}

impl TryFrom<String> for Format {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Display rule for one key.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DisplayRule {
    /// Value format.
    #[serde(default)]
    pub format: Format,
    /// Unit shown next to the value.
    #[serde(default)]
    pub unit: Option<String>,
    /// Human-readable name of the key.
    #[serde(default)]
    pub label: Option<String>,
}

impl DisplayRule {
    /// A rule with just a format.
    pub fn new(format: Format) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    /// Set the unit.
    pub fn unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    /// Set the label.
    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

/// Key to display rule mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRules {
    rules: BTreeMap<String, DisplayRule>,
}

impl Default for DisplayRules {
    /// `tempEx` rounded, `co2equivalente` with no decimals,
    /// `co2evitadototal` with two.
    fn default() -> Self {
        Self::empty()
            .with_rule(
                "tempEx",
                DisplayRule::new(Format::Round)
                    .unit("°C")
                    .label("Outside temperature"),
            )
            .with_rule(
                "co2equivalente",
                DisplayRule::new(Format::Fixed(0))
                    .unit("t")
                    .label("CO₂ equivalent"),
            )
            .with_rule(
                "co2evitadototal",
                DisplayRule::new(Format::Fixed(2))
                    .unit("t")
                    .label("CO₂ avoided (total)"),
            )
    }
}

impl DisplayRules {
    /// No rules; every key displays raw.
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Add or replace the rule for `key`.
    pub fn with_rule(mut self, key: &str, rule: DisplayRule) -> Self {
        self.rules.insert(key.to_string(), rule);
        self
    }

    /// Add or replace rules from `overrides`.
    ///
    /// Keys match case-insensitively, since configuration sources may
    /// lowercase them.
    pub fn merge(mut self, overrides: BTreeMap<String, DisplayRule>) -> Self {
        for (key, rule) in overrides {
            let key = self
                .rules
                .keys()
                .find(|k| k.eq_ignore_ascii_case(&key))
                .cloned()
                .unwrap_or(key);
            self.rules.insert(key, rule);
        }
        self
    }

    /// The rule for `key`, if one is configured.
    pub fn rule(&self, key: &str) -> Option<&DisplayRule> {
        self.rules.get(key).or_else(|| {
            self.rules
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, rule)| rule)
        })
    }

    /// Label for `key`, falling back to the key itself.
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.rule(key)
            .and_then(|r| r.label.as_deref())
            .unwrap_or(key)
    }

    /// Unit for `key`, if any.
    pub fn unit(&self, key: &str) -> Option<&str> {
        self.rule(key).and_then(|r| r.unit.as_deref())
    }

    /// Format one value of `key`.
    pub fn format(&self, key: &str, raw: &SampleValue) -> String {
        self.rule(key).map(|r| r.format).unwrap_or_default().apply(raw)
    }

    /// Format the current value of every key that has one.
    pub fn format_latest(&self, values: &LatestValues) -> BTreeMap<String, String> {
        values
            .keys()
            .filter_map(|key| {
                latest_value(values, key).map(|raw| (key.clone(), self.format(key, raw)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecowatch_types::Sample;

    #[test]
    fn test_default_rules() {
        let rules = DisplayRules::default();

        assert_eq!(rules.format("tempEx", &"21,7".into()), "22");
        assert_eq!(rules.format("tempEx", &"21,4".into()), "21");
        assert_eq!(rules.format("tempEx", &"-0,4".into()), "0");
        assert_eq!(rules.format("co2equivalente", &"1234,56".into()), "1235");
        assert_eq!(rules.format("co2evitadototal", &"12.3456".into()), "12.35");
        assert_eq!(rules.format("co2evitadototal", &SampleValue::Number(7.0)), "7.00");
        assert_eq!(rules.format("status", &"ONLINE".into()), "ONLINE");
    }

    #[test]
    fn test_unparsable_numeric_shows_dash() {
        let rules = DisplayRules::default();
        assert_eq!(rules.format("tempEx", &"sensor offline".into()), MISSING);
        assert_eq!(rules.format("co2equivalente", &"".into()), MISSING);
    }

    #[test]
    fn test_unit_suffix_shows_dash() {
        let rules = DisplayRules::default();
        assert_eq!(rules.format("tempEx", &"21,5 °C".into()), MISSING);
        assert_eq!(rules.format("co2equivalente", &"12,7 t".into()), MISSING);
        assert_eq!(rules.format("co2equivalente", &" 12,7 ".into()), "13");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("raw".parse::<Format>(), Ok(Format::Raw));
        assert_eq!("Round".parse::<Format>(), Ok(Format::Round));
        assert_eq!("fixed:3".parse::<Format>(), Ok(Format::Fixed(3)));
        assert!("fixed:".parse::<Format>().is_err());
        assert!("percent".parse::<Format>().is_err());
        assert_eq!(Format::Fixed(2).to_string(), "fixed:2");
    }

    #[test]
    fn test_merge_overrides_and_extends() {
        let mut overrides = BTreeMap::new();
        overrides.insert("tempEx".to_string(), DisplayRule::new(Format::Fixed(1)));
        overrides.insert(
            "deltaEa+Total".to_string(),
            DisplayRule::new(Format::Round).unit("kWh"),
        );

        let rules = DisplayRules::default().merge(overrides);
        assert_eq!(rules.format("tempEx", &"21,76".into()), "21.8");
        assert_eq!(rules.format("deltaEa+Total", &"10,2".into()), "10");
        assert_eq!(rules.unit("deltaEa+Total"), Some("kWh"));
        assert_eq!(rules.label("deltaEa+Total"), "deltaEa+Total");
        assert_eq!(rules.format("co2equivalente", &"3".into()), "3");
    }

    #[test]
    fn test_merge_ignores_key_case() {
        let mut overrides = BTreeMap::new();
        overrides.insert("tempex".to_string(), DisplayRule::new(Format::Raw));

        let rules = DisplayRules::default().merge(overrides);
        assert_eq!(rules.format("tempEx", &"21,5".into()), "21,5");
        assert_eq!(rules.rule("TEMPEX").map(|r| r.format), Some(Format::Raw));
    }

    #[test]
    fn test_format_latest() {
        let mut values = LatestValues::new();
        values.insert("tempEx".to_string(), vec![Sample::new(1, "19,5"), Sample::new(0, "1")]);
        values.insert("co2evitadototal".to_string(), vec![Sample::new(1, "abc")]);
        values.insert("status".to_string(), vec![Sample::new(1, "ok")]);
        values.insert("empty".to_string(), Vec::new());

        let display = DisplayRules::default().format_latest(&values);
        assert_eq!(display.len(), 3);
        assert_eq!(display["tempEx"], "20");
        assert_eq!(display["co2evitadototal"], "-");
        assert_eq!(display["status"], "ok");
    }

    #[test]
    fn test_rule_deserializes_from_toml_shape() {
        let rule: DisplayRule =
            serde_json::from_str(r#"{"format": "fixed:1", "unit": "kWh"}"#).unwrap();
        assert_eq!(rule.format, Format::Fixed(1));
        assert_eq!(rule.unit.as_deref(), Some("kWh"));

        assert!(serde_json::from_str::<DisplayRule>(r#"{"format": "bogus"}"#).is_err());
    }
}
