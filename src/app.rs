//! Application state.
//!
//! [`DashboardState`] is what the refresh tasks write and the renderers
//! read. [`App`] is the terminal session on top of it: theme, overlays and
//! the handle used to request refreshes.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use parking_lot::RwLock;

use crate::data::{ChartId, DisplayRules, SourceSplit, GRID_KEY, SOLAR_KEY};
use crate::refresh::{ChartSeries, RefreshHandle, RenderTarget, ValueTarget};
use crate::ui::Theme;

/// The rendered dashboard data.
///
/// Every update replaces a whole chart or the whole value map, so readers
/// never see a partial refresh.
#[derive(Debug, Default)]
pub struct DashboardState {
    charts: RwLock<BTreeMap<ChartId, ChartSeries>>,
    values: RwLock<BTreeMap<String, String>>,
    charts_updated: RwLock<Option<DateTime<Local>>>,
    values_updated: RwLock<Option<DateTime<Local>>>,
}

impl DashboardState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Datasets of one chart, if it has been rendered.
    pub fn chart(&self, id: ChartId) -> Option<ChartSeries> {
        self.charts.read().get(&id).cloned()
    }

    /// Every rendered chart.
    pub fn charts(&self) -> BTreeMap<ChartId, ChartSeries> {
        self.charts.read().clone()
    }

    /// Current values, key to display text.
    pub fn values(&self) -> BTreeMap<String, String> {
        self.values.read().clone()
    }

    /// When the charts were last replaced.
    pub fn charts_updated(&self) -> Option<DateTime<Local>> {
        *self.charts_updated.read()
    }

    /// When the values were last replaced.
    pub fn values_updated(&self) -> Option<DateTime<Local>> {
        *self.values_updated.read()
    }

    /// Solar versus grid split over the energy chart's 12 months.
    pub fn source_split(&self) -> Option<SourceSplit> {
        let charts = self.charts.read();
        let energy = charts.get(&ChartId::Energy)?;
        let series_of = |key: &str| energy.iter().find(|(d, _)| d.key == key).map(|(_, s)| s);

        SourceSplit::from_series(series_of(SOLAR_KEY)?, series_of(GRID_KEY)?)
    }
}

impl RenderTarget for DashboardState {
    fn replace_series(&self, chart: ChartId, series: ChartSeries) {
        self.charts.write().insert(chart, series);
        *self.charts_updated.write() = Some(Local::now());
    }
}

impl ValueTarget for DashboardState {
    fn replace_values(&self, values: BTreeMap<String, String>) {
        *self.values.write() = values;
        *self.values_updated.write() = Some(Local::now());
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,

    // Data
    pub state: Arc<DashboardState>,
    pub rules: DisplayRules,
    source: String,
    refresh: Option<RefreshHandle>,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App reading from `state`.
    pub fn new(state: Arc<DashboardState>, rules: DisplayRules, source: &str) -> Self {
        Self {
            running: true,
            show_help: false,
            state,
            rules,
            source: source.to_string(),
            refresh: None,
            theme: Theme::auto_detect(),
            status_message: None,
        }
    }

    /// Attach the refresh loop so `r` can request a refresh.
    pub fn with_refresh_handle(mut self, handle: RefreshHandle) -> Self {
        self.refresh = Some(handle);
        self
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        &self.source
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Ask the refresh loop for an immediate refresh.
    pub fn request_refresh(&mut self) {
        match &self.refresh {
            Some(handle) => {
                handle.refresh_now();
                self.set_status_message("Refreshing...".to_string());
            }
            None => self.set_status_message("Refresh is not running".to_string()),
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Switch between the light and dark theme.
    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }

    /// Stop the application.
    pub fn quit(&mut self) {
        self.running = false;
        if let Some(handle) = &self.refresh {
            handle.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ecowatch_types::{MonthBucket, MonthlySeries};

    use crate::data::ChartSpec;

    fn series(total: f64) -> MonthlySeries {
        let mut bucket = MonthBucket::new(2025, 0, "Jan");
        bucket.sum = total;
        MonthlySeries::new(vec![bucket])
    }

    fn energy(solar: f64, grid: f64) -> ChartSeries {
        let spec = ChartSpec::energy();
        vec![
            (spec.datasets[0].clone(), series(solar)),
            (spec.datasets[1].clone(), series(grid)),
        ]
    }

    #[test]
    fn test_replace_series_is_whole() {
        let state = DashboardState::new();
        assert!(state.charts_updated().is_none());

        state.replace_series(ChartId::Energy, energy(30.0, 10.0));
        state.replace_series(ChartId::Energy, energy(10.0, 10.0));

        let chart = state.chart(ChartId::Energy).unwrap();
        assert_eq!(chart.len(), 2);
        assert_eq!(chart[0].1.total(), 10.0);
        assert!(state.chart(ChartId::Co2).is_none());
        assert!(state.charts_updated().is_some());
    }

    #[test]
    fn test_source_split() {
        let state = DashboardState::new();
        assert!(state.source_split().is_none());

        state.replace_series(ChartId::Energy, energy(30.0, 10.0));
        let split = state.source_split().unwrap();
        assert_eq!((split.solar_percent, split.grid_percent), (75, 25));

        state.replace_series(ChartId::Energy, energy(0.0, 0.0));
        assert!(state.source_split().is_none());
    }

    #[test]
    fn test_replace_values() {
        let state = DashboardState::new();
        let mut values = BTreeMap::new();
        values.insert("tempEx".to_string(), "22".to_string());

        state.replace_values(values.clone());
        assert_eq!(state.values(), values);

        state.replace_values(BTreeMap::new());
        assert!(state.values().is_empty());
        assert!(state.values_updated().is_some());
    }

    #[test]
    fn test_refresh_without_loop_sets_status() {
        let mut app = App::new(Arc::new(DashboardState::new()), DisplayRules::default(), "test");
        app.request_refresh();
        assert_eq!(app.get_status_message(), Some("Refresh is not running"));

        app.quit();
        assert!(!app.running);
    }
}
