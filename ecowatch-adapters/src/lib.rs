//! # ecowatch-adapters
//!
//! Adapters for reading energy and CO₂ telemetry from upstream IoT platforms.
//!
//! ## Supported Systems
//!
//! - **ThingsBoard** (`thingsboard` feature, default) - Reads the latest
//!   values and historical timeseries of an asset via the ThingsBoard REST API
//!
//! ## Quick Start (ThingsBoard)
//!
//! ```rust,no_run
//! use ecowatch_adapters::thingsboard::ThingsBoardAdapter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = ThingsBoardAdapter::builder()
//!         .endpoint("https://thingsboard.example.com")
//!         .credentials("tenant@example.com", "secret")
//!         .asset_id("784f394c-42b6-435a-983c-b7beff2784f9")
//!         .build()?;
//!
//!     let latest = adapter.latest().await?;
//!     println!("Got {} keys", latest.len());
//!     Ok(())
//! }
//! ```

pub mod error;

#[cfg(feature = "thingsboard")]
pub mod thingsboard;

pub use error::AdapterError;

// Re-export types for convenience
pub use ecowatch_types::{HistoryWindow, LatestValues, Sample, SampleValue};
