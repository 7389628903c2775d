//! # ecowatch-types
//!
//! Core types shared by the ecowatch proxy and dashboard. This crate defines
//! the telemetry sample shape returned by the upstream IoT platform, the
//! request window for historical queries, and the fixed-length monthly series
//! handed to chart renderers.
//!
//! ## Design Goals
//!
//! - **Tolerant input**: samples with missing or oddly-typed fields still
//!   deserialize, so one bad entry never poisons a whole batch
//! - **Locale aware values**: decimal commas (`"12,5"`) normalize to `12.5`
//! - **Fixed output shape**: a [`MonthlySeries`] is always chronological and
//!   never mutated after construction
//!
//! ## Features
//!
//! - `serde`: JSON (de)serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use ecowatch_types::{HistoryWindow, Sample, SampleValue};
//!
//! let window = HistoryWindow::new(1_700_000_000_000, 1_700_086_400_000).unwrap();
//! assert!(window.contains(1_700_000_000_000));
//!
//! let sample = Sample::new(1_700_000_000_000, "12,5");
//! assert_eq!(sample.value.unwrap().normalize().unwrap(), 12.5);
//! ```

mod sample;
mod series;
mod window;

pub use sample::*;
pub use series::*;
pub use window::*;

/// Number of monthly buckets in every aggregated series.
pub const MONTHS_PER_SERIES: usize = 12;
