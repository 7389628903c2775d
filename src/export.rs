//! One-shot JSON export of the dashboard.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Serialize;

use ecowatch_types::{HistoryWindow, MonthlySeries};

use crate::app::DashboardState;
use crate::data::{ChartId, SourceSplit};

/// One dataset of an exported chart.
#[derive(Debug, Serialize)]
pub struct ExportedDataset {
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub total: f64,
    pub months: MonthlySeries,
}

/// Everything the dashboard shows, at one instant.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Local>,
    pub window: Option<HistoryWindow>,
    pub charts: BTreeMap<ChartId, Vec<ExportedDataset>>,
    pub values: BTreeMap<String, String>,
    pub source_split: Option<SourceSplit>,
}

impl Snapshot {
    /// Capture the current contents of `state`.
    pub fn capture(state: &DashboardState, window: Option<HistoryWindow>) -> Self {
        let charts = state
            .charts()
            .into_iter()
            .map(|(id, series)| {
                let datasets = series
                    .into_iter()
                    .map(|(dataset, months)| ExportedDataset {
                        key: dataset.key,
                        label: dataset.label,
                        unit: dataset.unit,
                        total: months.total(),
                        months,
                    })
                    .collect();
                (id, datasets)
            })
            .collect();

        Self {
            generated_at: Local::now(),
            window,
            charts,
            values: state.values(),
            source_split: state.source_split(),
        }
    }

    /// Write the snapshot as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ecowatch_types::MonthBucket;

    use crate::data::ChartSpec;
    use crate::refresh::{RenderTarget, ValueTarget};

    #[test]
    fn test_export_snapshot() {
        let state = DashboardState::new();
        let spec = ChartSpec::energy();
        let mut january = MonthBucket::new(2025, 0, "Jan");
        january.sum = 40.0;
        let mut february = MonthBucket::new(2025, 1, "Feb");
        february.sum = 10.0;

        state.replace_series(
            ChartId::Energy,
            vec![
                (spec.datasets[0].clone(), MonthlySeries::new(vec![january])),
                (spec.datasets[1].clone(), MonthlySeries::new(vec![february])),
            ],
        );
        let mut values = BTreeMap::new();
        values.insert("tempEx".to_string(), "22".to_string());
        state.replace_values(values);

        let window = HistoryWindow::new(0, 1000).unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        Snapshot::capture(&state, Some(window)).write(file.path()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(json["window"]["startTs"], 0);
        assert_eq!(json["values"]["tempEx"], "22");
        assert_eq!(json["source_split"]["solar_percent"], 80);
        assert_eq!(json["charts"]["energy"][0]["key"], "energiasolarconsumida");
        assert_eq!(json["charts"]["energy"][0]["total"], 40.0);
        assert!(json["charts"].get("co2").is_none());
    }
}
