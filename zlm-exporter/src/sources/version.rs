use zlm_api::Endpoint;
use zlm_api::models::VersionInfo;

use super::Source;
use crate::metrics::{MetricsError, ZlmMetrics};
use crate::scrape::SampleBuffer;

/// Server build information as an info metric.
pub struct VersionSource;

impl Source for VersionSource {
    const ENDPOINT: Endpoint = Endpoint::Version;
    type Payload = VersionInfo;

    fn transform(
        version: VersionInfo,
        metrics: &ZlmMetrics,
        out: &mut SampleBuffer,
    ) -> Result<(), MetricsError> {
        out.emit(
            &metrics.version_info,
            1.0,
            [version.branch_name, version.build_time, version.commit_hash],
        )
    }
}

/// One sample per API endpoint the server exposes.
pub struct ApiListSource;

impl Source for ApiListSource {
    const ENDPOINT: Endpoint = Endpoint::ApiList;
    type Payload = Vec<String>;

    fn transform(
        endpoints: Vec<String>,
        metrics: &ZlmMetrics,
        out: &mut SampleBuffer,
    ) -> Result<(), MetricsError> {
        for endpoint in endpoints {
            out.emit(&metrics.api_status, 1.0, [endpoint])?;
        }
        Ok(())
    }
}
