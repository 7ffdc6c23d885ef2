use std::collections::HashSet;

use zlm_api::Endpoint;
use zlm_api::models::MediaInfo;

use super::Source;
use crate::metrics::{MetricsError, ZlmMetrics};
use crate::scrape::SampleBuffer;

/// Media streams, one record per protocol variant.
///
/// Records sharing `(vhost, app, stream)` are the same source republished
/// under another schema. Stream-level values (total readers, stream count)
/// are reported once per triple; everything else once per record.
pub struct StreamsSource;

impl Source for StreamsSource {
    const ENDPOINT: Endpoint = Endpoint::MediaList;
    type Payload = Vec<MediaInfo>;

    fn transform(
        streams: Vec<MediaInfo>,
        metrics: &ZlmMetrics,
        out: &mut SampleBuffer,
    ) -> Result<(), MetricsError> {
        let mut seen: HashSet<(&str, &str, &str)> = HashSet::new();

        for media in &streams {
            let triple = (
                media.vhost.as_str(),
                media.app.as_str(),
                media.stream.as_str(),
            );
            // first record of a triple wins
            if seen.insert(triple) {
                out.emit(
                    &metrics.stream_total_reader_count,
                    media.total_reader_count as f64,
                    [triple.0, triple.1, triple.2],
                )?;
            }

            out.emit(
                &metrics.stream_info,
                1.0,
                [
                    media.vhost.as_str(),
                    media.app.as_str(),
                    media.stream.as_str(),
                    media.schema.as_str(),
                    media.origin_type_str.as_str(),
                    media.origin_url.as_str(),
                ],
            )?;

            let labels = [
                media.vhost.as_str(),
                media.app.as_str(),
                media.stream.as_str(),
                media.schema.as_str(),
            ];
            let status = if media.bytes_speed > 0.0 { 1.0 } else { 0.0 };
            out.emit(&metrics.stream_status, status, labels)?;
            out.emit(
                &metrics.stream_reader_count,
                media.reader_count as f64,
                labels,
            )?;
            out.emit(&metrics.stream_bitrate, media.bytes_speed, labels)?;
            out.emit(
                &metrics.stream_alive_second,
                media.alive_second as f64,
                labels,
            )?;
            out.emit(
                &metrics.stream_create_stamp,
                media.create_stamp as f64,
                labels,
            )?;
        }

        out.emit_unlabeled(&metrics.stream_total, seen.len() as f64)
    }
}
