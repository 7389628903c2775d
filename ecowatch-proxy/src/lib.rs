//! # ecowatch-proxy
//!
//! Server-side proxy between the ecowatch dashboard and ThingsBoard.
//!
//! The proxy holds the upstream credentials, logs in on every request and
//! re-exposes two read-only endpoints, so dashboards never see a token.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ecowatch_adapters::thingsboard::ThingsBoardAdapter;
//! use ecowatch_proxy::{ProxyConfig, ProxyServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = ThingsBoardAdapter::builder()
//!         .endpoint("https://thingsboard.example.com")
//!         .credentials("tenant@example.com", "secret")
//!         .asset_id("784f394c-42b6-435a-983c-b7beff2784f9")
//!         .build()?;
//!
//!     ProxyServer::new(ProxyConfig::with_port(3000), Arc::new(adapter))
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod server;
pub mod settings;
pub mod upstream;

pub use server::{ProxyConfig, ProxyError, ProxyServer};
pub use settings::ThingsBoardSettings;
pub use upstream::Upstream;
