//! Chart definitions: which telemetry keys feed which chart.

use std::collections::BTreeSet;

use serde::Serialize;

/// The charts the dashboard draws from monthly history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartId {
    /// Avoided versus emitted CO₂.
    Co2,
    /// Solar versus grid energy consumed.
    Energy,
}

/// One series of a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    /// Telemetry key the series is aggregated from.
    pub key: &'static str,
    /// Legend text.
    pub label: &'static str,
    /// Unit of the monthly sums.
    pub unit: &'static str,
}

/// A chart and the datasets it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    /// Which chart.
    pub id: ChartId,
    /// Title shown above the chart.
    pub title: &'static str,
    /// Series, in legend order.
    pub datasets: Vec<Dataset>,
}

impl ChartSpec {
    /// The CO₂ chart.
    pub fn co2() -> Self {
        Self {
            id: ChartId::Co2,
            title: "CO₂",
            datasets: vec![
                Dataset {
                    key: "co2evitado",
                    label: "CO₂ avoided",
                    unit: "t",
                },
                Dataset {
                    key: "co2emitido",
                    label: "CO₂ emitted",
                    unit: "t",
                },
            ],
        }
    }

    /// The energy mix chart. Its two datasets also feed the source split.
    pub fn energy() -> Self {
        Self {
            id: ChartId::Energy,
            title: "Energy",
            datasets: vec![
                Dataset {
                    key: SOLAR_KEY,
                    label: "Solar",
                    unit: "kWh",
                },
                Dataset {
                    key: GRID_KEY,
                    label: "Grid",
                    unit: "kWh",
                },
            ],
        }
    }

    /// Telemetry keys of this chart.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.datasets.iter().map(|d| d.key)
    }
}

/// Solar energy consumed.
pub const SOLAR_KEY: &str = "energiasolarconsumida";

/// Grid energy consumed.
pub const GRID_KEY: &str = "energiaredeconsumida";

/// Every chart the dashboard shows.
pub fn default_charts() -> Vec<ChartSpec> {
    vec![ChartSpec::co2(), ChartSpec::energy()]
}

/// Union of the keys of `charts`, each once.
pub fn chart_keys(charts: &[ChartSpec]) -> BTreeSet<String> {
    charts
        .iter()
        .flat_map(|c| c.keys())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_keys() {
        let keys = chart_keys(&default_charts());
        let keys: Vec<_> = keys.iter().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["co2emitido", "co2evitado", "energiaredeconsumida", "energiasolarconsumida"]
        );
    }

    #[test]
    fn test_chart_keys_dedup() {
        let keys = chart_keys(&[ChartSpec::energy(), ChartSpec::energy()]);
        assert_eq!(keys.len(), 2);
    }
}
