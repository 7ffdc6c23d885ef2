use zlm_api::Endpoint;
use zlm_api::models::ThreadLoad;

use super::Source;
use crate::metrics::{MetricsError, ThreadPoolMetrics, ZlmMetrics};
use crate::scrape::SampleBuffer;

/// Poller (network) thread load, aggregated over the pool.
pub struct NetworkThreadsSource;

impl Source for NetworkThreadsSource {
    const ENDPOINT: Endpoint = Endpoint::NetworkThreads;
    type Payload = Vec<ThreadLoad>;

    fn transform(
        threads: Vec<ThreadLoad>,
        metrics: &ZlmMetrics,
        out: &mut SampleBuffer,
    ) -> Result<(), MetricsError> {
        emit_pool(&threads, &metrics.network_threads, out)
    }
}

/// Work thread load, aggregated over the pool.
pub struct WorkThreadsSource;

impl Source for WorkThreadsSource {
    const ENDPOINT: Endpoint = Endpoint::WorkThreads;
    type Payload = Vec<ThreadLoad>;

    fn transform(
        threads: Vec<ThreadLoad>,
        metrics: &ZlmMetrics,
        out: &mut SampleBuffer,
    ) -> Result<(), MetricsError> {
        emit_pool(&threads, &metrics.work_threads, out)
    }
}

// Per-thread identity is not exported, only pool totals.
fn emit_pool(
    threads: &[ThreadLoad],
    pool: &ThreadPoolMetrics,
    out: &mut SampleBuffer,
) -> Result<(), MetricsError> {
    let load_total: f64 = threads.iter().map(|t| t.load).sum();
    let delay_total: f64 = threads.iter().map(|t| t.delay).sum();

    out.emit_unlabeled(&pool.total, threads.len() as f64)?;
    out.emit_unlabeled(&pool.load_total, load_total)?;
    out.emit_unlabeled(&pool.delay_total, delay_total)
}
