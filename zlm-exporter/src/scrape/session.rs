//! Per-cycle scrape state.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::metrics::{DescHandle, MetricsError, Sample, ScrapeStats};

/// Write side of a cycle's sample stream.
///
/// Cloned into every source task; the orchestrator owns the single reader.
#[derive(Debug, Clone)]
pub struct SampleSink {
    tx: mpsc::UnboundedSender<Sample>,
}

impl SampleSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Sample>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Publish samples; returns how many reached the reader.
    ///
    /// Once the cycle has been abandoned the reader is gone and samples are
    /// dropped.
    pub fn publish(&self, samples: impl IntoIterator<Item = Sample>) -> usize {
        let mut sent = 0;
        for sample in samples {
            if self.tx.send(sample).is_err() {
                break;
            }
            sent += 1;
        }
        sent
    }
}

/// Samples produced by one source, held back until the source has finished
/// without error.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    samples: Vec<Sample>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit<I, S>(&mut self, desc: &DescHandle, value: f64, label_values: I) -> Result<(), MetricsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.samples.push(Sample::new(desc, value, label_values)?);
        Ok(())
    }

    pub fn emit_unlabeled(&mut self, desc: &DescHandle, value: f64) -> Result<(), MetricsError> {
        self.samples.push(Sample::unlabeled(desc, value)?);
        Ok(())
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

/// State shared by the source tasks of one cycle.
#[derive(Debug)]
pub struct ScrapeSession {
    deadline: Instant,
    sink: SampleSink,
    stats: Arc<ScrapeStats>,
}

impl ScrapeSession {
    pub fn new(deadline: Instant, sink: SampleSink, stats: Arc<ScrapeStats>) -> Self {
        Self {
            deadline,
            sink,
            stats,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn sink(&self) -> &SampleSink {
        &self.sink
    }

    pub fn stats(&self) -> &ScrapeStats {
        &self.stats
    }
}
