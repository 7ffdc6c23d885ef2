//! Metric descriptors, counters and Prometheus exposition.
//!
//! # Features
//!
//! - Descriptor registry built once at startup ([`DescriptorRegistry`])
//! - Catalog of every media-server metric family ([`ZlmMetrics`])
//! - Process-lifetime scrape counters ([`ScrapeStats`])
//! - Text exposition encoder ([`TextEncoder`])
//!
//! # Example
//!
//! ```
//! use zlm_exporter::metrics::{DescriptorRegistry, Sample, TextEncoder, ZlmMetrics};
//!
//! let mut registry = DescriptorRegistry::new();
//! let metrics = ZlmMetrics::register(&mut registry).unwrap();
//!
//! let sample = Sample::unlabeled(&metrics.stream_total, 2.0).unwrap();
//! let text = TextEncoder::new().encode(&[sample]);
//! assert!(text.contains("zlm_stream_total 2"));
//! ```

mod catalog;
mod prometheus;
mod registry;
mod stats;

pub use catalog::{NAMESPACE, StatisticsMetrics, ThreadPoolMetrics, ZlmMetrics};
pub use prometheus::{TEXT_CONTENT_TYPE, TextEncoder};
pub use registry::{
    DescHandle, DescriptorRegistry, MetricDesc, MetricType, MetricsError, Sample, build_fq_name,
};
pub use stats::{ScrapeStats, ScrapeStatsSnapshot};
