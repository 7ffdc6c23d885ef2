//! Prometheus text exposition.
//!
//! Renders samples in the text format scraped by Prometheus: one `HELP` and
//! one `TYPE` line per family, followed by that family's samples.

use std::collections::HashMap;
use std::fmt::Write;

use super::registry::{MetricDesc, Sample};

/// Content type of the text exposition format.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Encodes samples to the text exposition format.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextEncoder;

impl TextEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Render `samples`, grouped by family in first-seen order.
    pub fn encode(&self, samples: &[Sample]) -> String {
        let mut families: Vec<(&MetricDesc, Vec<&Sample>)> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for sample in samples {
            let desc = sample.desc().as_ref();
            match index.get(desc.fq_name()) {
                Some(&i) => families[i].1.push(sample),
                None => {
                    index.insert(desc.fq_name(), families.len());
                    families.push((desc, vec![sample]));
                }
            }
        }

        let mut output = String::new();
        for (desc, samples) in families {
            self.write_header(&mut output, desc);
            for sample in samples {
                self.write_sample(&mut output, desc, sample);
            }
        }
        output
    }

    fn write_header(&self, output: &mut String, desc: &MetricDesc) {
        let _ = writeln!(output, "# HELP {} {}", desc.fq_name(), escape_help(desc.help()));
        let _ = writeln!(output, "# TYPE {} {}", desc.fq_name(), desc.metric_type());
    }

    fn write_sample(&self, output: &mut String, desc: &MetricDesc, sample: &Sample) {
        output.push_str(desc.fq_name());

        if !desc.label_names().is_empty() {
            let labels_str = desc
                .label_names()
                .iter()
                .zip(sample.label_values())
                .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
                .collect::<Vec<_>>()
                .join(",");
            let _ = write!(output, "{{{}}}", labels_str);
        }

        let _ = writeln!(output, " {}", format_value(sample.value()));
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}
