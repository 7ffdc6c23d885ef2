use zlm_api::Endpoint;
use zlm_api::models::SessionInfo;

use super::Source;
use crate::metrics::{MetricsError, ZlmMetrics};
use crate::scrape::SampleBuffer;

/// Connected client sessions.
pub struct SessionsSource;

impl Source for SessionsSource {
    const ENDPOINT: Endpoint = Endpoint::Sessions;
    type Payload = Vec<SessionInfo>;

    fn transform(
        sessions: Vec<SessionInfo>,
        metrics: &ZlmMetrics,
        out: &mut SampleBuffer,
    ) -> Result<(), MetricsError> {
        let total = sessions.len();
        for session in sessions {
            out.emit(
                &metrics.session_info,
                1.0,
                [
                    session.id,
                    session.identifier,
                    session.local_ip,
                    session.local_port,
                    session.peer_ip,
                    session.peer_port,
                    session.typeid,
                ],
            )?;
        }
        out.emit_unlabeled(&metrics.session_total, total as f64)
    }
}
