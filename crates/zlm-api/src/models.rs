//! Payload shapes carried in the `data` slot of each endpoint's response.

use serde::{Deserialize, Deserializer};

/// `index/api/version`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VersionInfo {
    pub branch_name: String,
    pub build_time: String,
    pub commit_hash: String,
}

/// One entry of `index/api/getThreadsLoad` or `index/api/getWorkThreadsLoad`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThreadLoad {
    pub load: f64,
    pub delay: f64,
}

/// A counter reported by `index/api/getStatistic`.
///
/// Depending on the server build a counter arrives as a JSON number or as a
/// numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl StatValue {
    /// Sample value for this counter.
    ///
    /// Numeric strings are parsed; anything that is not a number yields `1.0`
    /// so the counter is still reported as present.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Number(value) => *value,
            Self::Text(text) => text.trim().parse().unwrap_or(1.0),
            Self::Other(_) => 1.0,
        }
    }
}

impl Default for StatValue {
    fn default() -> Self {
        Self::Number(0.0)
    }
}

/// `index/api/getStatistic`: live object counts inside the server.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Statistics {
    pub buffer: StatValue,
    pub buffer_like_string: StatValue,
    pub buffer_list: StatValue,
    pub buffer_raw: StatValue,
    pub frame: StatValue,
    pub frame_imp: StatValue,
    pub media_source: StatValue,
    pub multi_media_source_muxer: StatValue,
    pub rtmp_packet: StatValue,
    pub rtp_packet: StatValue,
    pub socket: StatValue,
    pub tcp_client: StatValue,
    pub tcp_server: StatValue,
    pub tcp_session: StatValue,
    pub udp_server: StatValue,
    pub udp_session: StatValue,
}

/// One entry of `index/api/getAllSession`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub identifier: String,
    pub local_ip: String,
    #[serde(deserialize_with = "string_or_number")]
    pub local_port: String,
    pub peer_ip: String,
    #[serde(deserialize_with = "string_or_number")]
    pub peer_port: String,
    pub typeid: String,
}

/// One entry of `index/api/getMediaList`.
///
/// The server republishes each source under several protocols; every
/// protocol variant is its own entry sharing `(vhost, app, stream)`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaInfo {
    pub vhost: String,
    pub app: String,
    pub stream: String,
    pub schema: String,
    pub alive_second: i64,
    pub bytes_speed: f64,
    pub create_stamp: i64,
    pub origin_type: i64,
    pub origin_type_str: String,
    pub origin_url: String,
    pub reader_count: i64,
    pub total_reader_count: i64,
}

/// One entry of `index/api/listRtpServer`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RtpServer {
    #[serde(deserialize_with = "string_or_number")]
    pub port: String,
    pub stream_id: String,
}

/// Accepts a JSON string or number and keeps its textual form.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
        Raw::Null(()) => String::new(),
    })
}
