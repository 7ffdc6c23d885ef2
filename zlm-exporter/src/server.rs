//! HTTP listener serving the exposition.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{Span, error, info};

use crate::collector::ZlmCollector;
use crate::config::{DEFAULT_TELEMETRY_PATH, DEFAULT_TIMEOUT};
use crate::error::{Error, Result};
use crate::metrics::TEXT_CONTENT_TYPE;

pub const HEALTH_PATH: &str = "/health";

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `host:port` to bind.
    pub bind_address: String,
    pub telemetry_path: String,
    /// Upper bound for one metrics request, including time queued behind
    /// another scrape.
    pub timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9101".to_string(),
            telemetry_path: DEFAULT_TELEMETRY_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<ZlmCollector>,
    pub telemetry_path: Arc<str>,
    pub timeout: Duration,
}

/// Build the router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let telemetry_path = state.telemetry_path.to_string();

    Router::new()
        .route(&telemetry_path, get(metrics_handler))
        .route("/", get(landing_handler))
        .route(HEALTH_PATH, get(health_handler))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request| {
                if req.uri().path() == HEALTH_PATH {
                    Span::none()
                } else {
                    let mut make_span =
                        tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO);
                    use tower_http::trace::MakeSpan;
                    make_span.make_span(req)
                }
            }),
        )
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match tokio::time::timeout(state.timeout, state.collector.render()).await {
        Ok(body) => ([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], body).into_response(),
        Err(_) => {
            error!(timeout = ?state.timeout, "metrics request timed out");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "scrape timed out, try again later\n",
            )
                .into_response()
        }
    }
}

async fn landing_handler(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>ZLMediaKit Exporter</title></head>\n\
         <body>\n\
         <h1>ZLMediaKit Exporter</h1>\n\
         <p><a href=\"{path}\">Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        path = state.telemetry_path
    ))
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Metrics HTTP server.
pub struct MetricsServer {
    config: ServerConfig,
    collector: Arc<ZlmCollector>,
    cancel_token: CancellationToken,
}

impl MetricsServer {
    pub fn new(config: ServerConfig, collector: Arc<ZlmCollector>) -> Self {
        Self {
            config,
            collector,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Get the cancellation token for graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    fn state(&self) -> AppState {
        AppState {
            collector: self.collector.clone(),
            telemetry_path: Arc::from(self.config.telemetry_path.as_str()),
            timeout: self.config.timeout,
        }
    }

    /// Bind and serve until cancelled.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind_address)
            .await
            .map_err(|e| {
                Error::Other(format!("failed to bind {}: {}", self.config.bind_address, e))
            })?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until cancelled.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        info!(
            "Metrics server listening on http://{}{}",
            addr, self.config.telemetry_path
        );

        let cancel_token = self.cancel_token.clone();
        axum::serve(listener, build_router(self.state()))
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("Metrics server shutting down...");
            })
            .await?;

        Ok(())
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use bytes::Bytes;
    use tokio::time::Instant;
    use tower::ServiceExt;
    use zlm_api::{ApiError, Endpoint, Fetcher};

    use super::*;
    use crate::collector::CollectorOptions;

    struct OkFetcher;

    #[async_trait]
    impl Fetcher for OkFetcher {
        async fn fetch(
            &self,
            _endpoint: Endpoint,
            _deadline: Instant,
        ) -> std::result::Result<Bytes, ApiError> {
            Ok(Bytes::from_static(br#"{"code":0}"#))
        }
    }

    fn state(timeout: Duration) -> AppState {
        let collector = ZlmCollector::new(Arc::new(OkFetcher), CollectorOptions::default()).unwrap();
        AppState {
            collector: Arc::new(collector),
            telemetry_path: Arc::from("/metrics"),
            timeout,
        }
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = router
            .oneshot(axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_metrics_route() {
        let (status, content_type, body) =
            get(build_router(state(Duration::from_secs(5))), "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some(TEXT_CONTENT_TYPE));
        assert!(body.contains("zlm_up 1"));
        assert!(body.contains("zlm_exporter_scrapes_total 1"));
    }

    #[tokio::test]
    async fn test_health_route() {
        let (status, _, body) = get(build_router(state(Duration::from_secs(5))), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_landing_links_telemetry_path() {
        let (status, _, body) = get(build_router(state(Duration::from_secs(5))), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"<a href="/metrics">"#));
    }

    #[tokio::test(start_paused = true)]
    async fn test_metrics_times_out_behind_running_scrape() {
        let state = state(Duration::from_secs(1));
        let _busy = state.collector.lock_for_test().await;

        let (status, _, _) = get(build_router(state.clone()), "/metrics").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0:9101");
        assert_eq!(config.telemetry_path, "/metrics");
    }
}
