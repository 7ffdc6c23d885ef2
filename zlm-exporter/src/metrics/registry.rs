//! Metric descriptors, the registry that owns them, and samples.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metric `{name}` is already registered")]
    DuplicateMetric { name: String },

    #[error("metric `{metric}` expects {expected} label values, got {got}")]
    LabelArity {
        metric: String,
        expected: usize,
        got: usize,
    },
}

/// Exposition type of a metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
    Counter,
}

impl MetricType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gauge => "gauge",
            Self::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable identity of a metric family.
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDesc {
    fq_name: String,
    help: String,
    label_names: Vec<String>,
    metric_type: MetricType,
}

/// Shared reference to a descriptor; every sample points at one.
pub type DescHandle = Arc<MetricDesc>;

impl MetricDesc {
    pub fn new(
        metric_type: MetricType,
        namespace: &str,
        subsystem: &str,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Self {
        Self {
            fq_name: build_fq_name(namespace, subsystem, name),
            help: help.to_string(),
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
            metric_type,
        }
    }

    pub fn fq_name(&self) -> &str {
        &self.fq_name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }
}

/// Joins the non-empty parts of a metric name with `_`.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Catalog of every metric the exporter can emit.
///
/// Filled once at startup and shared read-only afterwards.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    descs: Vec<DescHandle>,
    names: HashSet<String>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gauge.
    pub fn register(
        &mut self,
        namespace: &str,
        subsystem: &str,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<DescHandle, MetricsError> {
        self.register_typed(MetricType::Gauge, namespace, subsystem, name, help, label_names)
    }

    /// Register a counter.
    pub fn register_counter(
        &mut self,
        namespace: &str,
        subsystem: &str,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<DescHandle, MetricsError> {
        self.register_typed(MetricType::Counter, namespace, subsystem, name, help, label_names)
    }

    fn register_typed(
        &mut self,
        metric_type: MetricType,
        namespace: &str,
        subsystem: &str,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<DescHandle, MetricsError> {
        let desc = MetricDesc::new(metric_type, namespace, subsystem, name, help, label_names);
        if !self.names.insert(desc.fq_name.clone()) {
            return Err(MetricsError::DuplicateMetric { name: desc.fq_name });
        }
        let handle = Arc::new(desc);
        self.descs.push(handle.clone());
        Ok(handle)
    }

    /// Every registered descriptor, in registration order.
    pub fn descriptors(&self) -> &[DescHandle] {
        &self.descs
    }

    pub fn len(&self) -> usize {
        self.descs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }
}

/// One labeled data point.
#[derive(Debug, Clone)]
pub struct Sample {
    desc: DescHandle,
    value: f64,
    label_values: Vec<String>,
}

impl Sample {
    /// Build a sample, checking the label values against the descriptor.
    pub fn new<I, S>(desc: &DescHandle, value: f64, label_values: I) -> Result<Self, MetricsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let label_values: Vec<String> = label_values.into_iter().map(Into::into).collect();
        if label_values.len() != desc.label_names.len() {
            return Err(MetricsError::LabelArity {
                metric: desc.fq_name.clone(),
                expected: desc.label_names.len(),
                got: label_values.len(),
            });
        }
        Ok(Self {
            desc: desc.clone(),
            value,
            label_values,
        })
    }

    pub fn unlabeled(desc: &DescHandle, value: f64) -> Result<Self, MetricsError> {
        Self::new(desc, value, std::iter::empty::<String>())
    }

    pub fn desc(&self) -> &DescHandle {
        &self.desc
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// Label value for `name`, if the descriptor has such a label.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.desc
            .label_names
            .iter()
            .position(|l| l == name)
            .map(|i| self.label_values[i].as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fq_name_skips_empty_parts() {
        assert_eq!(build_fq_name("zlm", "stream", "total"), "zlm_stream_total");
        assert_eq!(build_fq_name("zlm", "", "up"), "zlm_up");
        assert_eq!(build_fq_name("", "", "up"), "up");
    }

    #[test]
    fn test_register_keeps_order() {
        let mut registry = DescriptorRegistry::new();
        registry.register("zlm", "a", "one", "first", &[]).unwrap();
        registry
            .register_counter("zlm", "b", "two_total", "second", &["endpoint"])
            .unwrap();

        let names: Vec<&str> = registry.descriptors().iter().map(|d| d.fq_name()).collect();
        assert_eq!(names, ["zlm_a_one", "zlm_b_two_total"]);
        assert_eq!(registry.descriptors()[1].metric_type(), MetricType::Counter);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = DescriptorRegistry::new();
        registry.register("zlm", "rtp", "server_total", "x", &[]).unwrap();
        let err = registry
            .register("zlm", "rtp", "server_total", "y", &["port"])
            .unwrap_err();
        assert!(matches!(err, MetricsError::DuplicateMetric { name } if name == "zlm_rtp_server_total"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_sample_label_arity() {
        let desc: DescHandle = Arc::new(MetricDesc::new(
            MetricType::Gauge,
            "zlm",
            "rtp",
            "server_info",
            "RTP server info",
            &["port", "stream_id"],
        ));

        let sample = Sample::new(&desc, 1.0, ["30000", "ch1"]).unwrap();
        assert_eq!(sample.label("stream_id"), Some("ch1"));
        assert_eq!(sample.label("missing"), None);

        let err = Sample::new(&desc, 1.0, ["30000"]).unwrap_err();
        assert!(matches!(err, MetricsError::LabelArity { expected: 2, got: 1, .. }));

        assert!(Sample::unlabeled(&desc, 1.0).is_err());
    }
}
