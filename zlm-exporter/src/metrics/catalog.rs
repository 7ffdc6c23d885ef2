//! Every metric family the exporter emits for the media server.

use super::registry::{DescHandle, DescriptorRegistry, MetricsError};

pub const NAMESPACE: &str = "zlm";

const SUBSYSTEM_VERSION: &str = "version";
const SUBSYSTEM_API: &str = "api";
const SUBSYSTEM_NETWORK_THREADS: &str = "network_threads";
const SUBSYSTEM_WORK_THREADS: &str = "work_threads";
const SUBSYSTEM_STATISTICS: &str = "statistics";
const SUBSYSTEM_SESSION: &str = "session";
const SUBSYSTEM_STREAM: &str = "stream";
const SUBSYSTEM_RTP: &str = "rtp";

const STREAM_LABELS: &[&str] = &["vhost", "app", "stream", "schema"];

/// Aggregates over a thread pool (`getThreadsLoad` / `getWorkThreadsLoad`).
#[derive(Debug, Clone)]
pub struct ThreadPoolMetrics {
    pub total: DescHandle,
    pub load_total: DescHandle,
    pub delay_total: DescHandle,
}

impl ThreadPoolMetrics {
    fn register(
        registry: &mut DescriptorRegistry,
        subsystem: &str,
        kind: &str,
    ) -> Result<Self, MetricsError> {
        Ok(Self {
            total: registry.register(
                NAMESPACE,
                subsystem,
                "total",
                &format!("Total number of {kind} threads"),
                &[],
            )?,
            load_total: registry.register(
                NAMESPACE,
                subsystem,
                "load_total",
                &format!("Total of {kind} threads load"),
                &[],
            )?,
            delay_total: registry.register(
                NAMESPACE,
                subsystem,
                "delay_total",
                &format!("Total of {kind} threads delay"),
                &[],
            )?,
        })
    }
}

/// Object counters from `getStatistic`, one gauge per field.
#[derive(Debug, Clone)]
pub struct StatisticsMetrics {
    pub buffer: DescHandle,
    pub buffer_like_string: DescHandle,
    pub buffer_list: DescHandle,
    pub buffer_raw: DescHandle,
    pub frame: DescHandle,
    pub frame_imp: DescHandle,
    pub media_source: DescHandle,
    pub multi_media_source_muxer: DescHandle,
    pub rtmp_packet: DescHandle,
    pub rtp_packet: DescHandle,
    pub socket: DescHandle,
    pub tcp_client: DescHandle,
    pub tcp_server: DescHandle,
    pub tcp_session: DescHandle,
    pub udp_server: DescHandle,
    pub udp_session: DescHandle,
}

impl StatisticsMetrics {
    fn register(registry: &mut DescriptorRegistry) -> Result<Self, MetricsError> {
        let mut stat = |name: &str, object: &str| {
            registry.register(
                NAMESPACE,
                SUBSYSTEM_STATISTICS,
                name,
                &format!("Statistics {object}"),
                &[],
            )
        };

        Ok(Self {
            buffer: stat("buffer", "buffer")?,
            buffer_like_string: stat("buffer_like_string", "BufferLikeString")?,
            buffer_list: stat("buffer_list", "BufferList")?,
            buffer_raw: stat("buffer_raw", "BufferRaw")?,
            frame: stat("frame", "Frame")?,
            frame_imp: stat("frame_imp", "FrameImp")?,
            media_source: stat("media_source", "MediaSource")?,
            multi_media_source_muxer: stat("multi_media_source_muxer", "MultiMediaSourceMuxer")?,
            rtmp_packet: stat("rtmp_packet", "RtmpPacket")?,
            rtp_packet: stat("rtp_packet", "RtpPacket")?,
            socket: stat("socket", "Socket")?,
            tcp_client: stat("tcp_client", "TcpClient")?,
            tcp_server: stat("tcp_server", "TcpServer")?,
            tcp_session: stat("tcp_session", "TcpSession")?,
            udp_server: stat("udp_server", "UdpServer")?,
            udp_session: stat("udp_session", "UdpSession")?,
        })
    }
}

/// Handles to every registered media-server metric.
#[derive(Debug, Clone)]
pub struct ZlmMetrics {
    pub version_info: DescHandle,
    pub api_status: DescHandle,

    pub network_threads: ThreadPoolMetrics,
    pub work_threads: ThreadPoolMetrics,

    pub statistics: StatisticsMetrics,

    pub session_info: DescHandle,
    pub session_total: DescHandle,

    pub stream_info: DescHandle,
    pub stream_status: DescHandle,
    pub stream_reader_count: DescHandle,
    pub stream_total_reader_count: DescHandle,
    pub stream_bitrate: DescHandle,
    pub stream_alive_second: DescHandle,
    pub stream_create_stamp: DescHandle,
    pub stream_total: DescHandle,

    pub rtp_server_info: DescHandle,
    pub rtp_server_total: DescHandle,

    /// Failed scrapes, labeled by endpoint path.
    pub scrape_errors: DescHandle,
}

impl ZlmMetrics {
    /// Register the whole catalog into `registry`.
    pub fn register(registry: &mut DescriptorRegistry) -> Result<Self, MetricsError> {
        Ok(Self {
            version_info: registry.register(
                NAMESPACE,
                SUBSYSTEM_VERSION,
                "info",
                "ZLMediaKit version info.",
                &["branchName", "buildTime", "commitHash"],
            )?,
            api_status: registry.register(
                NAMESPACE,
                SUBSYSTEM_API,
                "status",
                "The status of API endpoint",
                &["endpoint"],
            )?,

            network_threads: ThreadPoolMetrics::register(
                registry,
                SUBSYSTEM_NETWORK_THREADS,
                "network",
            )?,
            work_threads: ThreadPoolMetrics::register(registry, SUBSYSTEM_WORK_THREADS, "work")?,

            statistics: StatisticsMetrics::register(registry)?,

            session_info: registry.register(
                NAMESPACE,
                SUBSYSTEM_SESSION,
                "info",
                "Session info",
                &[
                    "id",
                    "identifier",
                    "local_ip",
                    "local_port",
                    "peer_ip",
                    "peer_port",
                    "typeid",
                ],
            )?,
            session_total: registry.register(
                NAMESPACE,
                SUBSYSTEM_SESSION,
                "total",
                "Total number of sessions",
                &[],
            )?,

            stream_info: registry.register(
                NAMESPACE,
                SUBSYSTEM_STREAM,
                "info",
                "Stream basic information",
                &["vhost", "app", "stream", "schema", "origin_type", "origin_url"],
            )?,
            stream_status: registry.register(
                NAMESPACE,
                SUBSYSTEM_STREAM,
                "status",
                "Stream status (1: active with data flowing, 0: inactive)",
                STREAM_LABELS,
            )?,
            stream_reader_count: registry.register(
                NAMESPACE,
                SUBSYSTEM_STREAM,
                "reader_count",
                "Stream reader count",
                STREAM_LABELS,
            )?,
            stream_total_reader_count: registry.register(
                NAMESPACE,
                SUBSYSTEM_STREAM,
                "total_reader_count",
                "Total reader count across all schemas",
                &["vhost", "app", "stream"],
            )?,
            stream_bitrate: registry.register(
                NAMESPACE,
                SUBSYSTEM_STREAM,
                "bitrate",
                "Stream bitrate",
                STREAM_LABELS,
            )?,
            stream_alive_second: registry.register(
                NAMESPACE,
                SUBSYSTEM_STREAM,
                "alive_second",
                "Stream alive second",
                STREAM_LABELS,
            )?,
            stream_create_stamp: registry.register(
                NAMESPACE,
                SUBSYSTEM_STREAM,
                "create_stamp",
                "Stream create stamp",
                STREAM_LABELS,
            )?,
            stream_total: registry.register(
                NAMESPACE,
                SUBSYSTEM_STREAM,
                "total",
                "Total number of streams",
                &[],
            )?,

            rtp_server_info: registry.register(
                NAMESPACE,
                SUBSYSTEM_RTP,
                "server_info",
                "RTP server info",
                &["port", "stream_id"],
            )?,
            rtp_server_total: registry.register(
                NAMESPACE,
                SUBSYSTEM_RTP,
                "server_total",
                "Total number of RTP servers",
                &[],
            )?,

            scrape_errors: registry.register_counter(
                NAMESPACE,
                "",
                "scrape_errors_total",
                "Number of errors while scraping ZLMediaKit.",
                &["endpoint"],
            )?,
        })
    }
}
