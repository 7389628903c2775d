//! Solar versus grid share of consumed energy.

use serde::Serialize;

use ecowatch_types::MonthlySeries;

/// Percentages of solar and grid energy, each rounded to an integer.
///
/// The two shares are rounded independently, so they may sum to 99 or 101.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceSplit {
    /// Solar share, 0 to 100.
    pub solar_percent: u8,
    /// Grid share, 0 to 100.
    pub grid_percent: u8,
}

impl SourceSplit {
    /// Split two energy totals.
    ///
    /// Negative totals count as zero. Returns `None` when there is nothing
    /// to split.
    ///
    /// # Example
    ///
    /// ```
    /// use ecowatch::data::SourceSplit;
    ///
    /// let split = SourceSplit::from_totals(300.0, 100.0).unwrap();
    /// assert_eq!((split.solar_percent, split.grid_percent), (75, 25));
    /// assert!(SourceSplit::from_totals(0.0, 0.0).is_none());
    /// ```
    pub fn from_totals(solar: f64, grid: f64) -> Option<Self> {
        let solar = solar.max(0.0);
        let grid = grid.max(0.0);
        let total = solar + grid;
        if !total.is_finite() || total <= 0.0 {
            return None;
        }

        Some(Self {
            solar_percent: percent(solar, total),
            grid_percent: percent(grid, total),
        })
    }

    /// Split the 12-month totals of two series.
    pub fn from_series(solar: &MonthlySeries, grid: &MonthlySeries) -> Option<Self> {
        Self::from_totals(solar.total(), grid.total())
    }
}

fn percent(part: f64, total: f64) -> u8 {
    ((part / total * 100.0) + 0.5).floor().clamp(0.0, 100.0) as u8
}
