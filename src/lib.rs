//! Open CAS Prometheus Exporter
//!
//! A Prometheus metrics exporter for Open CAS Linux block caches.
//!
//! # Overview
//!
//! The exporter runs `casadm` on a fixed interval, decodes its CSV output and
//! keeps the latest reading of every cache instance in memory. Prometheus scrapes
//! that snapshot over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   --list-caches      ┌──────────────┐
//! │   casadm    │ ◄─────────────────── │   Exporter   │
//! │             │   --stats (CSV)      │              │
//! └─────────────┘                      │ ┌──────────┐ │      HTTP      ┌────────────┐
//!                                      │ │Extractor │ │ ◄────────────► │ Prometheus │
//!                                      │ └────┬─────┘ │   /metrics     └────────────┘
//!                                      │ ┌────▼─────┐ │
//!                                      │ │ Metrics  │ │
//!                                      │ └──────────┘ │
//!                                      └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`casadm`] - casadm invocation and CSV decoding
//! - [`metrics`] - Metric model and Prometheus rendering
//! - [`collectors`] - Mapping of cache statistics onto metric points
//! - [`extraction`] - Periodic extraction loop
//! - [`server`] - HTTP server and process wiring
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use cas_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod casadm;
pub mod collectors;
pub mod config;
pub mod error;
pub mod extraction;
pub mod metrics;
pub mod server;
