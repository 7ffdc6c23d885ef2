//! Integration tests against a mock ZLMediaKit API.
//!
//! The mock serves every scraped endpoint on a random local port; the
//! exporter talks to it through the real HTTP client.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Uri};
use axum::response::IntoResponse;
use serde_json::{Value, json};
use zlm_api::{ClientConfig, Endpoint, SECRET_HEADER, ZlmClient};
use zlm_exporter::metrics::{Sample, TEXT_CONTENT_TYPE};
use zlm_exporter::server::{MetricsServer, ServerConfig};
use zlm_exporter::{CollectorOptions, ZlmCollector};

const SECRET: &str = "035c73f7-bb6b-4889-a715-d9eb2d1925cc";

#[derive(Clone, Default)]
struct MockOptions {
    /// Path whose handler never answers in time.
    slow_path: Option<&'static str>,
}

fn payload(path: &str) -> Option<Value> {
    let data = match path {
        "/index/api/version" => json!({
            "branchName": "master",
            "buildTime": "2024-05-01T10:00:00",
            "commitHash": "5d2a1c9"
        }),
        "/index/api/getApiList" => json!(["/index/api/getApiList", "/index/api/version"]),
        "/index/api/getThreadsLoad" => json!([
            {"load": 10, "delay": 2},
            {"load": 30, "delay": 4}
        ]),
        "/index/api/getWorkThreadsLoad" => json!([{"load": 5, "delay": 1}]),
        "/index/api/getStatistic" => json!({
            "Buffer": 10,
            "MediaSource": "100",
            "Socket": "unknown"
        }),
        "/index/api/getAllSession" => json!([{
            "id": "140",
            "identifier": "3-140",
            "local_ip": "10.0.0.1",
            "local_port": 554,
            "peer_ip": "10.0.0.9",
            "peer_port": 50312,
            "typeid": "mediakit::RtspSession"
        }]),
        "/index/api/getMediaList" => json!([
            {
                "vhost": "a", "app": "b", "stream": "c", "schema": "rtsp",
                "aliveSecond": 30, "bytesSpeed": 2048, "createStamp": 1700000000,
                "originType": 1, "originTypeStr": "rtmp_push", "originUrl": "rtmp://x/b/c",
                "readerCount": 1, "totalReaderCount": 3
            },
            {
                "vhost": "a", "app": "b", "stream": "c", "schema": "rtmp",
                "aliveSecond": 30, "bytesSpeed": 0, "createStamp": 1700000000,
                "originType": 1, "originTypeStr": "rtmp_push", "originUrl": "rtmp://x/b/c",
                "readerCount": 2, "totalReaderCount": 3
            }
        ]),
        "/index/api/listRtpServer" => json!([{"port": 30000, "stream_id": "ch1"}]),
        _ => return None,
    };
    Some(data)
}

async fn mock_api(
    State(options): State<MockOptions>,
    uri: Uri,
    headers: HeaderMap,
) -> impl IntoResponse {
    let path = uri.path().to_string();

    if options.slow_path == Some(path.as_str()) {
        tokio::time::sleep(Duration::from_secs(30)).await;
    }

    if headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok()) != Some(SECRET) {
        return axum::Json(json!({"code": -100, "msg": "Incorrect secret"}));
    }

    match payload(&path) {
        Some(data) => axum::Json(json!({"code": 0, "data": data})),
        None => axum::Json(json!({"code": -500, "msg": "api not found"})),
    }
}

/// Start the mock API; returns its base URL.
async fn start_mock(options: MockOptions) -> String {
    let app = Router::new().fallback(mock_api).with_state(options);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

fn collector(base_url: String, secret: &str, options: CollectorOptions) -> ZlmCollector {
    let client = ZlmClient::new(ClientConfig {
        base_url,
        secret: secret.to_string(),
        request_timeout: Duration::from_secs(5),
        ssl_verify: true,
    })
    .unwrap();
    ZlmCollector::new(Arc::new(client), options).unwrap()
}

fn family<'a>(samples: &'a [Sample], fq_name: &str) -> Vec<&'a Sample> {
    samples
        .iter()
        .filter(|s| s.desc().fq_name() == fq_name)
        .collect()
}

fn value(samples: &[Sample], fq_name: &str) -> f64 {
    let found = family(samples, fq_name);
    assert_eq!(found.len(), 1, "{fq_name}");
    found[0].value()
}

mod collector_tests {
    use super::*;

    #[tokio::test]
    async fn test_full_scrape() {
        let base_url = start_mock(MockOptions::default()).await;
        let collector = collector(base_url, SECRET, CollectorOptions::default());

        let samples = collector.collect().await;

        assert_eq!(value(&samples, "zlm_up"), 1.0);
        assert_eq!(value(&samples, "zlm_exporter_scrapes_total"), 1.0);
        assert!(family(&samples, "zlm_scrape_errors_total").is_empty());

        assert_eq!(value(&samples, "zlm_network_threads_total"), 2.0);
        assert_eq!(value(&samples, "zlm_network_threads_load_total"), 40.0);
        assert_eq!(value(&samples, "zlm_network_threads_delay_total"), 6.0);
        assert_eq!(value(&samples, "zlm_work_threads_total"), 1.0);

        assert_eq!(value(&samples, "zlm_statistics_buffer"), 10.0);
        assert_eq!(value(&samples, "zlm_statistics_media_source"), 100.0);
        assert_eq!(value(&samples, "zlm_statistics_socket"), 1.0);

        assert_eq!(value(&samples, "zlm_session_total"), 1.0);
        let session = family(&samples, "zlm_session_info");
        assert_eq!(session[0].label("local_port"), Some("554"));

        assert_eq!(family(&samples, "zlm_api_status").len(), 2);
        assert_eq!(value(&samples, "zlm_rtp_server_total"), 1.0);
    }

    #[tokio::test]
    async fn test_schema_variants_of_one_stream() {
        let base_url = start_mock(MockOptions::default()).await;
        let collector = collector(base_url, SECRET, CollectorOptions::default());

        let samples = collector.collect().await;

        assert_eq!(value(&samples, "zlm_stream_total_reader_count"), 3.0);
        assert_eq!(value(&samples, "zlm_stream_total"), 1.0);
        for name in [
            "zlm_stream_info",
            "zlm_stream_status",
            "zlm_stream_reader_count",
            "zlm_stream_bitrate",
            "zlm_stream_alive_second",
            "zlm_stream_create_stamp",
        ] {
            assert_eq!(family(&samples, name).len(), 2, "{name}");
        }

        let status: Vec<_> = family(&samples, "zlm_stream_status")
            .iter()
            .map(|s| (s.label("schema").unwrap().to_string(), s.value()))
            .collect();
        assert!(status.contains(&("rtsp".to_string(), 1.0)));
        assert!(status.contains(&("rtmp".to_string(), 0.0)));
    }

    #[tokio::test]
    async fn test_wrong_secret_counts_every_endpoint() {
        let base_url = start_mock(MockOptions::default()).await;
        let collector = collector(base_url, "wrong", CollectorOptions::default());

        let samples = collector.collect().await;

        // every source failed, but the cycle itself completed
        assert_eq!(value(&samples, "zlm_up"), 1.0);
        let errors = family(&samples, "zlm_scrape_errors_total");
        assert_eq!(errors.len(), 8);
        assert!(errors.iter().all(|s| s.value() == 1.0));
        assert!(family(&samples, "zlm_version_info").is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let collector = collector(format!("http://{addr}"), SECRET, CollectorOptions::default());
        let samples = collector.collect().await;

        assert_eq!(value(&samples, "zlm_up"), 1.0);
        assert_eq!(family(&samples, "zlm_scrape_errors_total").len(), 8);
        assert_eq!(collector.stats().snapshot().scrape_errors.len(), 8);
    }

    #[tokio::test]
    async fn test_slow_endpoint_marks_down() {
        let base_url = start_mock(MockOptions {
            slow_path: Some("/index/api/getAllSession"),
        })
        .await;
        let collector = collector(
            base_url,
            SECRET,
            CollectorOptions {
                scrape_deadline: Duration::from_millis(500),
                ..Default::default()
            },
        );

        let samples = collector.collect().await;

        assert_eq!(value(&samples, "zlm_up"), 0.0);
        assert!(family(&samples, "zlm_session_total").is_empty());
        assert_eq!(value(&samples, "zlm_stream_total"), 1.0);
        assert_eq!(value(&samples, "zlm_exporter_scrapes_total"), 1.0);

        // the late endpoint is the only one charged with an error
        assert_eq!(collector.stats().errors(Endpoint::Sessions), 1);
        let errors = family(&samples, "zlm_scrape_errors_total");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].label("endpoint"), Some(Endpoint::Sessions.path()));
    }

    #[tokio::test]
    async fn test_describe_matches_catalog() {
        let collector = collector("http://127.0.0.1".to_string(), SECRET, CollectorOptions::default());

        let descs = collector.describe();

        // 37 catalog families plus up and scrapes_total
        assert_eq!(descs.len(), 39);
        let mut names: Vec<_> = descs.iter().map(|d| d.fq_name().to_string()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 39);
    }
}

mod server_tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_endpoint_over_http() {
        let base_url = start_mock(MockOptions::default()).await;
        let collector = Arc::new(collector(base_url, SECRET, CollectorOptions::default()));

        let server = Arc::new(MetricsServer::new(
            ServerConfig {
                bind_address: "127.0.0.1:0".to_string(),
                ..Default::default()
            },
            collector,
        ));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let running = {
            let server = server.clone();
            tokio::spawn(async move { server.serve(listener).await })
        };

        zlm_api::install_rustls_provider();
        let http = reqwest::Client::builder().build().unwrap();
        let response = http
            .get(format!("http://{addr}/metrics"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(
            response.headers()[reqwest::header::CONTENT_TYPE],
            TEXT_CONTENT_TYPE
        );

        let body = response.text().await.unwrap();
        assert!(body.contains("# TYPE zlm_up gauge\nzlm_up 1\n"));
        assert!(body.contains(
            "zlm_version_info{branchName=\"master\",buildTime=\"2024-05-01T10:00:00\",commitHash=\"5d2a1c9\"} 1\n"
        ));
        assert!(body.contains("zlm_stream_total_reader_count{vhost=\"a\",app=\"b\",stream=\"c\"} 3\n"));
        assert!(!body.contains(SECRET));

        server.shutdown();
        running.await.unwrap().unwrap();
    }
}
