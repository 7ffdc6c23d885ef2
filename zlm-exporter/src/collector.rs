//! The describe/collect surface served to the exposition layer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::error;
use zlm_api::Fetcher;

use crate::build_info::BuildInfo;
use crate::metrics::{
    DescHandle, DescriptorRegistry, MetricDesc, MetricType, MetricsError, NAMESPACE, Sample,
    ScrapeStats, TextEncoder, ZlmMetrics,
};
use crate::scrape::{DEFAULT_SCRAPE_DEADLINE, ScrapeResult, Scraper};

#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Only emit media-server metrics, without the exporter's build info.
    pub metric_only: bool,
    pub scrape_deadline: Duration,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            metric_only: true,
            scrape_deadline: DEFAULT_SCRAPE_DEADLINE,
        }
    }
}

/// Collector for one media server.
///
/// `collect` runs one full scrape cycle; concurrent callers queue behind the
/// cycle in progress.
pub struct ZlmCollector {
    registry: DescriptorRegistry,
    scraper: Scraper,
    up: DescHandle,
    scrapes_total: DescHandle,
    build_info: Option<(DescHandle, BuildInfo)>,
    cycle: Mutex<()>,
}

impl ZlmCollector {
    pub fn new(fetcher: Arc<dyn Fetcher>, options: CollectorOptions) -> Result<Self, MetricsError> {
        let mut registry = DescriptorRegistry::new();
        let metrics = Arc::new(ZlmMetrics::register(&mut registry)?);
        let scraper = Scraper::new(fetcher, metrics, Arc::new(ScrapeStats::new()))
            .with_deadline(options.scrape_deadline);

        let up = Arc::new(MetricDesc::new(
            MetricType::Gauge,
            NAMESPACE,
            "",
            "up",
            "Was the last scrape of ZLMediaKit successful.",
            &[],
        ));
        let scrapes_total = Arc::new(MetricDesc::new(
            MetricType::Counter,
            NAMESPACE,
            "exporter",
            "scrapes_total",
            "Current total ZLMediaKit scrapes.",
            &[],
        ));
        let build_info = (!options.metric_only).then(|| {
            let desc = Arc::new(MetricDesc::new(
                MetricType::Gauge,
                NAMESPACE,
                "exporter",
                "build_info",
                "A metric with a constant '1' value labeled by version, commit and build date of the exporter.",
                &["version", "commit", "build_date"],
            ));
            (desc, BuildInfo::current())
        });

        Ok(Self {
            registry,
            scraper,
            up,
            scrapes_total,
            build_info,
            cycle: Mutex::new(()),
        })
    }

    pub fn stats(&self) -> &Arc<ScrapeStats> {
        self.scraper.stats()
    }

    /// Every descriptor `collect` may emit. Does not scrape.
    pub fn describe(&self) -> Vec<DescHandle> {
        let mut descs = self.registry.descriptors().to_vec();
        descs.push(self.up.clone());
        descs.push(self.scrapes_total.clone());
        if let Some((desc, _)) = &self.build_info {
            descs.push(desc.clone());
        }
        descs
    }

    /// Run one scrape cycle and return its samples plus the exporter's own.
    pub async fn collect(&self) -> Vec<Sample> {
        let _guard = self.cycle.lock().await;

        let ScrapeResult {
            outcome,
            mut samples,
            ..
        } = self.scraper.scrape().await;

        let stats = self.scraper.stats();
        let scrape_errors = &self.scraper.metrics().scrape_errors;
        for (endpoint, count) in stats.error_counts() {
            push(
                &mut samples,
                Sample::new(scrape_errors, count as f64, [endpoint.path()]),
            );
        }

        push(&mut samples, Sample::unlabeled(&self.up, outcome.up_value()));
        push(
            &mut samples,
            Sample::unlabeled(&self.scrapes_total, stats.scrapes_total() as f64),
        );
        if let Some((desc, info)) = &self.build_info {
            push(
                &mut samples,
                Sample::new(
                    desc,
                    1.0,
                    [
                        info.version.as_str(),
                        info.commit.as_str(),
                        info.build_date.as_str(),
                    ],
                ),
            );
        }

        samples
    }

    #[cfg(test)]
    pub(crate) async fn lock_for_test(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.cycle.lock().await
    }

    /// `collect` rendered in the text exposition format.
    pub async fn render(&self) -> String {
        TextEncoder::new().encode(&self.collect().await)
    }
}

fn push(samples: &mut Vec<Sample>, sample: Result<Sample, MetricsError>) {
    match sample {
        Ok(sample) => samples.push(sample),
        Err(e) => error!(error = %e, "dropping exporter sample"),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bytes::Bytes;
    use tokio::time::Instant;
    use zlm_api::{ApiError, Endpoint};

    use super::*;

    /// Answers every endpoint with a success envelope and no payload.
    struct EmptyFetcher;

    #[async_trait]
    impl Fetcher for EmptyFetcher {
        async fn fetch(&self, endpoint: Endpoint, _deadline: Instant) -> Result<Bytes, ApiError> {
            match endpoint {
                Endpoint::Sessions => Ok(Bytes::from_static(br#"{"code":-1,"msg":"boom"}"#)),
                _ => Ok(Bytes::from_static(br#"{"code":0}"#)),
            }
        }
    }

    fn collector(options: CollectorOptions) -> ZlmCollector {
        ZlmCollector::new(Arc::new(EmptyFetcher), options).unwrap()
    }

    fn find<'a>(samples: &'a [Sample], fq_name: &str) -> Vec<&'a Sample> {
        samples
            .iter()
            .filter(|s| s.desc().fq_name() == fq_name)
            .collect()
    }

    #[test]
    fn test_describe_is_registry_plus_process_counters() {
        let collector = collector(CollectorOptions::default());

        let descs = collector.describe();

        assert_eq!(descs.len(), collector.registry.len() + 2);
        let names: Vec<_> = descs.iter().map(|d| d.fq_name()).collect();
        assert!(names.contains(&"zlm_up"));
        assert!(names.contains(&"zlm_exporter_scrapes_total"));
        assert!(!names.contains(&"zlm_exporter_build_info"));
    }

    #[test]
    fn test_describe_with_build_info() {
        let collector = collector(CollectorOptions {
            metric_only: false,
            ..Default::default()
        });
        assert_eq!(collector.describe().len(), collector.registry.len() + 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_collect_appends_exporter_samples() {
        let collector = collector(CollectorOptions::default());

        let samples = collector.collect().await;

        assert_eq!(find(&samples, "zlm_up")[0].value(), 1.0);
        assert_eq!(find(&samples, "zlm_exporter_scrapes_total")[0].value(), 1.0);
        assert!(find(&samples, "zlm_exporter_build_info").is_empty());

        let errors = find(&samples, "zlm_scrape_errors_total");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].label("endpoint"), Some("index/api/getAllSession"));
        assert_eq!(errors[0].value(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_counters_are_cumulative() {
        let collector = collector(CollectorOptions::default());

        collector.collect().await;
        let samples = collector.collect().await;

        assert_eq!(find(&samples, "zlm_exporter_scrapes_total")[0].value(), 2.0);
        assert_eq!(find(&samples, "zlm_scrape_errors_total")[0].value(), 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_collects_are_serialized() {
        let collector = Arc::new(collector(CollectorOptions::default()));

        let (a, b) = tokio::join!(collector.collect(), collector.collect());

        let mut totals = vec![
            find(&a, "zlm_exporter_scrapes_total")[0].value(),
            find(&b, "zlm_exporter_scrapes_total")[0].value(),
        ];
        totals.sort_by(f64::total_cmp);
        assert_eq!(totals, [1.0, 2.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_info_sample() {
        let collector = collector(CollectorOptions {
            metric_only: false,
            ..Default::default()
        });

        let samples = collector.collect().await;

        let info = find(&samples, "zlm_exporter_build_info");
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].label("version"), Some(env!("CARGO_PKG_VERSION")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_is_exposition_text() {
        let collector = collector(CollectorOptions::default());

        let text = collector.render().await;

        assert!(text.contains("# TYPE zlm_up gauge"));
        assert!(text.contains("zlm_up 1"));
        assert!(text.contains("# TYPE zlm_exporter_scrapes_total counter"));
        assert!(text.contains("zlm_scrape_errors_total{endpoint=\"index/api/getAllSession\"} 1"));
    }
}
