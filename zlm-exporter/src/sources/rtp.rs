use zlm_api::Endpoint;
use zlm_api::models::RtpServer;

use super::Source;
use crate::metrics::{MetricsError, ZlmMetrics};
use crate::scrape::SampleBuffer;

/// Open RTP receive ports.
pub struct RtpServersSource;

impl Source for RtpServersSource {
    const ENDPOINT: Endpoint = Endpoint::RtpServers;
    type Payload = Vec<RtpServer>;

    fn transform(
        servers: Vec<RtpServer>,
        metrics: &ZlmMetrics,
        out: &mut SampleBuffer,
    ) -> Result<(), MetricsError> {
        let total = servers.len();
        for server in servers {
            out.emit(&metrics.rtp_server_info, 1.0, [server.port, server.stream_id])?;
        }
        out.emit_unlabeled(&metrics.rtp_server_total, total as f64)
    }
}
