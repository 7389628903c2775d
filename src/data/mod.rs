//! Data processing for the dashboard.
//!
//! This module turns raw telemetry into what the renderers show.
//!
//! ## Submodules
//!
//! - [`monthly`]: Folding raw samples into 12 monthly buckets, and the matching query window
//! - [`display`]: Per-key formatting rules for current values
//! - [`energy`]: Solar versus grid split of the energy totals
//! - [`charts`]: Which telemetry keys feed which chart
//!
//! ## Data Flow
//!
//! ```text
//! Vec<Sample> (raw JSON from the proxy)
//!        │
//!        ▼
//! aggregate_monthly()
//!        │
//!        ├──▶ MonthlySeries per key (replaces the chart datasets)
//!        │
//!        └──▶ SourceSplit::from_series() (energy keys only)
//!
//! LatestValues ──▶ DisplayRules::format_latest() ──▶ key → display text
//! ```

pub mod charts;
pub mod display;
pub mod energy;
pub mod monthly;

pub use charts::{chart_keys, default_charts, ChartId, ChartSpec, Dataset, GRID_KEY, SOLAR_KEY};
pub use display::{DisplayRule, DisplayRules, Format};
pub use energy::SourceSplit;
pub use monthly::{aggregate_monthly, trailing_months, trailing_window, MonthLocale};
