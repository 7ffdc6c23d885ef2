//! Authenticated HTTP access to the administrative API.

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tokio::time::Instant;
use tracing::{debug, trace};
use url::Url;

use crate::endpoint::Endpoint;
use crate::error::ApiError;

/// Header carrying the API secret. The secret never goes into the query
/// string, where it would end up in access logs.
pub const SECRET_HEADER: &str = "secret";

/// Source of raw endpoint bodies.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the body of `endpoint`, giving up once `deadline` has passed.
    async fn fetch(&self, endpoint: Endpoint, deadline: Instant) -> Result<Bytes, ApiError>;
}

/// Settings for [`ZlmClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// API base URL, e.g. `http://127.0.0.1:8080`.
    pub base_url: String,
    pub secret: String,
    /// Upper bound for a single request; `Duration::ZERO` disables it.
    pub request_timeout: Duration,
    /// When false, invalid TLS certificates are accepted.
    pub ssl_verify: bool,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("secret", &mask_secret(&self.secret))
            .field("request_timeout", &self.request_timeout)
            .field("ssl_verify", &self.ssl_verify)
            .finish()
    }
}

/// Mask a secret for display, keeping at most two characters at each end.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => "<empty>".to_string(),
        1..=4 => "****".to_string(),
        n => {
            let head: String = chars[..2].iter().collect();
            let tail: String = chars[n - 2..].iter().collect();
            format!("{head}****{tail}")
        }
    }
}

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// HTTP client for one media-server instance.
#[derive(Clone)]
pub struct ZlmClient {
    http: Client,
    base_url: String,
    secret: String,
}

impl fmt::Debug for ZlmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZlmClient")
            .field("base_url", &self.base_url)
            .field("secret", &mask_secret(&self.secret))
            .finish_non_exhaustive()
    }
}

impl ZlmClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        install_rustls_provider();

        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));

        if config.request_timeout > Duration::ZERO {
            builder = builder.timeout(config.request_timeout);
        }

        if !config.ssl_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(ApiError::Client)?;

        Ok(Self::with_client(http, config.base_url, config.secret))
    }

    /// Build on top of an existing `reqwest::Client`.
    pub fn with_client(http: Client, base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            secret: secret.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join the base URL and the endpoint path.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url, ApiError> {
        join_url(&self.base_url, endpoint.path())
    }

    async fn send(&self, endpoint: Endpoint, url: Url) -> Result<Bytes, ApiError> {
        let response = self
            .http
            .get(url)
            .header(SECRET_HEADER, &self.secret)
            .send()
            .await
            .map_err(|e| ApiError::network(endpoint, e))?;

        trace!(%endpoint, status = %response.status(), "received response");

        // The body is read to completion here; the connection is released on
        // every path, including when the caller later fails to decode it.
        response
            .bytes()
            .await
            .map_err(|e| ApiError::network(endpoint, e))
    }
}

#[async_trait]
impl Fetcher for ZlmClient {
    async fn fetch(&self, endpoint: Endpoint, deadline: Instant) -> Result<Bytes, ApiError> {
        let url = self.endpoint_url(endpoint)?;
        debug!(%endpoint, "fetching");

        match tokio::time::timeout_at(deadline, self.send(endpoint, url)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout { endpoint }),
        }
    }
}

fn join_url(base: &str, path: &str) -> Result<Url, ApiError> {
    let base = base.trim();
    if base.is_empty() {
        return Err(ApiError::invalid_url(base, "empty base URL"));
    }

    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let url = Url::parse(&joined).map_err(|e| ApiError::invalid_url(&joined, e.to_string()))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ApiError::invalid_url(
            joined,
            format!("unsupported scheme `{scheme}`"),
        )),
    }
}
