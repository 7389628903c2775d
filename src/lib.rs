//! # ecowatch
//!
//! A terminal dashboard for the energy and CO₂ telemetry of a ThingsBoard
//! asset, read through `ecowatch-proxy`.
//!
//! The dashboard's core is a historical time-series pipeline: for every
//! charted key it fetches the raw history of the trailing 12 months, folds
//! the samples into 12 calendar-month buckets and replaces the chart's
//! datasets in one go. Current values are fetched alongside and formatted
//! per key.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌──────────┐    ┌─────────┐  │
//! │  │ refresh │───▶│   data   │───▶│   app    │───▶│   ui    │  │
//! │  │ (timer) │    │(monthly) │    │ (state)  │    │(ratatui)│  │
//! │  └────┬────┘    └──────────┘    └──────────┘    └─────────┘  │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  ┌─────────┐                                                 │
//! │  │ source  │◀── HistoryFetcher (retry) ◀── ProxyClient       │
//! │  │ (input) │                                                 │
//! │  └─────────┘                                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: The [`TelemetryClient`] trait, the HTTP client for the
//!   proxy and the retrying [`HistoryFetcher`]
//! - **[`data`]**: Monthly aggregation, display formatting, chart definitions
//!   and the solar versus grid split
//! - **[`refresh`]**: The [`RefreshOrchestrator`] that runs concurrent
//!   fetch and aggregate cycles on a timer
//! - **[`app`]**: Shared dashboard state and the terminal session
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`retry`]**: Bounded retry with linear or fixed backoff
//! - **[`settings`]**: File and environment configuration
//! - **[`export`]**: One-shot JSON export
//!
//! ## Usage
//!
//! ```bash
//! # Draw the dashboard
//! ecowatch --proxy-url http://localhost:3000
//!
//! # Log refreshes without a terminal
//! ecowatch --headless --interval 60
//!
//! # Refresh once and write JSON
//! ecowatch --export dashboard.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use ecowatch::data::{aggregate_monthly, MonthLocale};
//! use ecowatch_types::Sample;
//!
//! let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
//! let june = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap().timestamp_millis();
//!
//! let samples = vec![Sample::new(june, "100"), Sample::new(june, "50,5")];
//! let series = aggregate_monthly(&samples, &now, MonthLocale::En);
//!
//! assert_eq!(series.len(), 12);
//! assert_eq!(series.labels().last(), Some(&"Jun"));
//! assert_eq!(series.values().last(), Some(&150.5));
//! ```

pub mod app;
pub mod data;
pub mod events;
pub mod export;
pub mod refresh;
pub mod retry;
pub mod settings;
pub mod source;
pub mod ui;

pub use app::{App, DashboardState};
pub use data::{aggregate_monthly, trailing_window, DisplayRules, MonthLocale, SourceSplit};
pub use refresh::{RefreshHandle, RefreshOrchestrator, RefreshSignal, RenderTarget, ValueTarget};
pub use retry::{Backoff, RetryPolicy};
pub use settings::DashboardSettings;
pub use source::{FetchError, HistoryFetcher, ProxyClient, TelemetryClient};
