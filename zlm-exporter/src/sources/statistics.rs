use zlm_api::Endpoint;
use zlm_api::models::Statistics;

use super::Source;
use crate::metrics::{MetricsError, ZlmMetrics};
use crate::scrape::SampleBuffer;

/// Live object counts, one gauge per counter.
pub struct StatisticsSource;

impl Source for StatisticsSource {
    const ENDPOINT: Endpoint = Endpoint::Statistics;
    type Payload = Statistics;

    fn transform(
        data: Statistics,
        metrics: &ZlmMetrics,
        out: &mut SampleBuffer,
    ) -> Result<(), MetricsError> {
        let m = &metrics.statistics;
        let values = [
            (&m.buffer, &data.buffer),
            (&m.buffer_like_string, &data.buffer_like_string),
            (&m.buffer_list, &data.buffer_list),
            (&m.buffer_raw, &data.buffer_raw),
            (&m.frame, &data.frame),
            (&m.frame_imp, &data.frame_imp),
            (&m.media_source, &data.media_source),
            (&m.multi_media_source_muxer, &data.multi_media_source_muxer),
            (&m.rtmp_packet, &data.rtmp_packet),
            (&m.rtp_packet, &data.rtp_packet),
            (&m.socket, &data.socket),
            (&m.tcp_client, &data.tcp_client),
            (&m.tcp_server, &data.tcp_server),
            (&m.tcp_session, &data.tcp_session),
            (&m.udp_server, &data.udp_server),
            (&m.udp_session, &data.udp_session),
        ];

        for (desc, value) in values {
            out.emit_unlabeled(desc, value.as_f64())?;
        }
        Ok(())
    }
}
