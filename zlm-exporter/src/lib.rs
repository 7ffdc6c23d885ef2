//! zlm-exporter library crate.
//!
//! Scrapes the ZLMediaKit HTTP API and exposes the results as Prometheus
//! metrics. The binary wires these modules together; they are public for
//! integration testing.

pub mod build_info;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod scrape;
pub mod server;
pub mod sources;

pub use collector::{CollectorOptions, ZlmCollector};
pub use config::ExporterConfig;
pub use error::{Error, Result};
