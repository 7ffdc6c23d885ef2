//! Source transformers: one per API endpoint.
//!
//! Each source pairs an endpoint with the payload type it decodes and the
//! mapping from that payload to samples. A source that fails to fetch or
//! decode is counted and logged, and contributes nothing to the cycle; it
//! never affects its siblings.

mod rtp;
mod sessions;
mod statistics;
mod streams;
mod threads;
mod version;

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::task::{Id, JoinSet};
use tracing::{debug, error};
use zlm_api::{Endpoint, Fetcher, decode_and_validate};

use crate::metrics::{MetricsError, ZlmMetrics};
use crate::scrape::{SampleBuffer, ScrapeSession};

pub use rtp::RtpServersSource;
pub use sessions::SessionsSource;
pub use statistics::StatisticsSource;
pub use streams::StreamsSource;
pub use threads::{NetworkThreadsSource, WorkThreadsSource};
pub use version::{ApiListSource, VersionSource};

/// Static description of one data source.
pub trait Source: Send + Sync + 'static {
    /// Endpoint this source scrapes.
    const ENDPOINT: Endpoint;

    /// Shape of the envelope's `data` slot.
    type Payload: DeserializeOwned + Default + Send;

    /// Map a decoded payload to samples.
    fn transform(
        payload: Self::Payload,
        metrics: &ZlmMetrics,
        out: &mut SampleBuffer,
    ) -> Result<(), MetricsError>;
}

/// Everything a source task needs for one cycle.
#[derive(Clone)]
pub struct SourceContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub metrics: Arc<ZlmMetrics>,
    pub session: Arc<ScrapeSession>,
}

/// Fetch, decode and transform `S`, publishing its samples on success.
///
/// Returns the endpoint so the caller can tell which source finished.
pub async fn run<S: Source>(ctx: SourceContext) -> Endpoint {
    let endpoint = S::ENDPOINT;

    match scrape::<S>(&ctx).await {
        Ok(buffer) => {
            let count = ctx.session.sink().publish(buffer.into_samples());
            debug!(%endpoint, samples = count, "source scraped");
        }
        Err(e) => {
            ctx.session.stats().record_error(endpoint);
            error!(%endpoint, kind = e.kind(), error = %e, "error scraping ZLMediaKit endpoint");
        }
    }

    endpoint
}

async fn scrape<S: Source>(ctx: &SourceContext) -> crate::Result<SampleBuffer> {
    let body = ctx
        .fetcher
        .fetch(S::ENDPOINT, ctx.session.deadline())
        .await?;
    let payload: S::Payload = decode_and_validate(S::ENDPOINT, &body)?;

    let mut buffer = SampleBuffer::new();
    S::transform(payload, &ctx.metrics, &mut buffer)?;
    Ok(buffer)
}

/// Spawn one task per source into `tasks`.
///
/// Returns the endpoint behind every spawned task id.
pub fn spawn_all(tasks: &mut JoinSet<Endpoint>, ctx: &SourceContext) -> HashMap<Id, Endpoint> {
    let mut spawned = HashMap::with_capacity(8);
    spawn::<VersionSource>(tasks, ctx, &mut spawned);
    spawn::<ApiListSource>(tasks, ctx, &mut spawned);
    spawn::<NetworkThreadsSource>(tasks, ctx, &mut spawned);
    spawn::<WorkThreadsSource>(tasks, ctx, &mut spawned);
    spawn::<StatisticsSource>(tasks, ctx, &mut spawned);
    spawn::<SessionsSource>(tasks, ctx, &mut spawned);
    spawn::<StreamsSource>(tasks, ctx, &mut spawned);
    spawn::<RtpServersSource>(tasks, ctx, &mut spawned);
    spawned
}

fn spawn<S: Source>(
    tasks: &mut JoinSet<Endpoint>,
    ctx: &SourceContext,
    spawned: &mut HashMap<Id, Endpoint>,
) {
    let handle = tasks.spawn(run::<S>(ctx.clone()));
    spawned.insert(handle.id(), S::ENDPOINT);
}
