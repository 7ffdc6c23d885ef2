//! Runs all sources for one cycle and decides whether the server is up.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{Id, JoinError, JoinSet};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error};
use zlm_api::{ApiError, Endpoint, Fetcher};

use super::session::{SampleSink, ScrapeSession};
use crate::metrics::{Sample, ScrapeStats, ZlmMetrics};
use crate::sources::{self, SourceContext};

/// Time budget for a whole cycle, measured from its start.
pub const DEFAULT_SCRAPE_DEADLINE: Duration = Duration::from_secs(12);

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// Every source finished before the deadline, successfully or not.
    Completed,
    /// The deadline fired first; unfinished sources were cancelled and
    /// counted as failed.
    TimedOut,
}

impl ScrapeOutcome {
    /// Value of the `up` gauge for this outcome.
    pub fn up_value(self) -> f64 {
        match self {
            Self::Completed => 1.0,
            Self::TimedOut => 0.0,
        }
    }
}

/// Everything a cycle produced.
#[derive(Debug)]
pub struct ScrapeResult {
    pub outcome: ScrapeOutcome,
    pub samples: Vec<Sample>,
    pub duration: Duration,
}

/// Drives scrape cycles against one media server.
pub struct Scraper {
    fetcher: Arc<dyn Fetcher>,
    metrics: Arc<ZlmMetrics>,
    stats: Arc<ScrapeStats>,
    deadline: Duration,
}

impl Scraper {
    pub fn new(fetcher: Arc<dyn Fetcher>, metrics: Arc<ZlmMetrics>, stats: Arc<ScrapeStats>) -> Self {
        Self {
            fetcher,
            metrics,
            stats,
            deadline: DEFAULT_SCRAPE_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn stats(&self) -> &Arc<ScrapeStats> {
        &self.stats
    }

    pub fn metrics(&self) -> &Arc<ZlmMetrics> {
        &self.metrics
    }

    /// Run one cycle.
    ///
    /// Never fails: source errors are counted and logged by the sources
    /// themselves. Sources still running at the deadline are cancelled and
    /// counted as timed out.
    pub async fn scrape(&self) -> ScrapeResult {
        let started = Instant::now();
        let deadline = started + self.deadline;
        let cycle = self.stats.record_scrape();

        let (sink, mut rx) = SampleSink::channel();
        let ctx = SourceContext {
            fetcher: self.fetcher.clone(),
            metrics: self.metrics.clone(),
            session: Arc::new(ScrapeSession::new(deadline, sink, self.stats.clone())),
        };

        let mut tasks: JoinSet<Endpoint> = JoinSet::new();
        let mut pending = sources::spawn_all(&mut tasks, &ctx);
        drop(ctx);

        let joined = timeout_at(deadline, async {
            while let Some(res) = tasks.join_next_with_id().await {
                settle(cycle, &mut pending, res);
            }
        })
        .await;

        let outcome = if joined.is_ok() {
            ScrapeOutcome::Completed
        } else {
            ScrapeOutcome::TimedOut
        };

        if outcome == ScrapeOutcome::TimedOut {
            // Tasks that still manage to finish while being aborted have
            // already counted their own result.
            tasks.abort_all();
            while let Some(res) = tasks.join_next_with_id().await {
                settle(cycle, &mut pending, res);
            }

            let mut late: Vec<Endpoint> = pending.into_values().collect();
            late.sort();
            for &endpoint in &late {
                self.stats.record_error(endpoint);
                let e = ApiError::Timeout { endpoint };
                error!(cycle, %endpoint, kind = e.kind(), error = %e, "error scraping ZLMediaKit endpoint");
            }
            error!(
                cycle,
                pending = late.len(),
                deadline = ?self.deadline,
                "scrape deadline exceeded, cancelled unfinished sources"
            );
        }

        let mut samples = Vec::new();
        while let Ok(sample) = rx.try_recv() {
            samples.push(sample);
        }

        let duration = started.elapsed();
        debug!(cycle, ?outcome, samples = samples.len(), ?duration, "scrape cycle finished");

        ScrapeResult {
            outcome,
            samples,
            duration,
        }
    }
}

/// Account for one joined source task.
///
/// A cancelled task stays in `pending`; it is reported as timed out.
fn settle(cycle: u64, pending: &mut HashMap<Id, Endpoint>, res: Result<(Id, Endpoint), JoinError>) {
    match res {
        Ok((id, endpoint)) => {
            pending.remove(&id);
            debug!(cycle, %endpoint, "source finished");
        }
        Err(e) if e.is_panic() => {
            let endpoint = pending.remove(&e.id());
            error!(cycle, endpoint = ?endpoint, error = %e, "source task panicked");
        }
        Err(_) => {}
    }
}
