//! Resolved exporter configuration.

use std::time::Duration;

use std::fmt;

use serde::{Serialize, Serializer};
pub use zlm_api::mask_secret;
use zlm_api::ClientConfig;

use crate::collector::CollectorOptions;
use crate::error::{Error, Result};
use crate::logging::LogFormat;
use crate::scrape::DEFAULT_SCRAPE_DEADLINE;
use crate::server::HEALTH_PATH;

pub const DEFAULT_LISTEN_ADDRESS: &str = ":9101";
pub const DEFAULT_TELEMETRY_PATH: &str = "/metrics";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Everything the exporter needs, already parsed from flags and environment.
#[derive(Clone, Serialize)]
pub struct ExporterConfig {
    pub listen_address: String,
    pub telemetry_path: String,
    #[serde(serialize_with = "serialize_duration")]
    pub timeout: Duration,
    pub ssl_verify: bool,
    pub metric_only: bool,
    pub api_url: String,
    #[serde(skip)]
    pub secret: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExporterConfig")
            .field("listen_address", &self.listen_address)
            .field("telemetry_path", &self.telemetry_path)
            .field("timeout", &self.timeout)
            .field("ssl_verify", &self.ssl_verify)
            .field("metric_only", &self.metric_only)
            .field("api_url", &self.api_url)
            .field("secret", &self.masked_secret())
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            telemetry_path: DEFAULT_TELEMETRY_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT,
            ssl_verify: true,
            metric_only: true,
            api_url: DEFAULT_API_URL.to_string(),
            secret: String::new(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl ExporterConfig {
    /// Reject configurations the exporter cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(Error::config("ZLMediaKit API URL must not be empty"));
        }
        if self.secret.is_empty() {
            return Err(Error::config("ZLMediaKit API secret must not be empty"));
        }
        if !self.telemetry_path.starts_with('/')
            || self.telemetry_path == "/"
            || self.telemetry_path == HEALTH_PATH
        {
            return Err(Error::config(format!(
                "telemetry path `{}` must start with `/` and not clash with `/` or `{HEALTH_PATH}`",
                self.telemetry_path
            )));
        }
        if !is_literal_path(&self.telemetry_path) {
            return Err(Error::config(format!(
                "telemetry path `{}` must not contain route parameters or wildcards",
                self.telemetry_path
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("web timeout must be greater than zero"));
        }
        self.bind_address()?;
        Ok(())
    }

    /// Address to bind; `:PORT` means every interface.
    pub fn bind_address(&self) -> Result<String> {
        let address = self.listen_address.trim();
        let (host, port) = address.rsplit_once(':').ok_or_else(|| {
            Error::config(format!("listen address `{address}` has no port"))
        })?;
        port.parse::<u16>().map_err(|_| {
            Error::config(format!("listen address `{address}` has an invalid port"))
        })?;

        if host.is_empty() {
            Ok(format!("0.0.0.0:{port}"))
        } else {
            Ok(address.to_string())
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.trim().to_string(),
            secret: self.secret.clone(),
            request_timeout: self.timeout,
            ssl_verify: self.ssl_verify,
        }
    }

    pub fn collector_options(&self) -> CollectorOptions {
        CollectorOptions {
            metric_only: self.metric_only,
            scrape_deadline: DEFAULT_SCRAPE_DEADLINE,
        }
    }

    pub fn masked_secret(&self) -> String {
        mask_secret(&self.secret)
    }
}

/// Whether `path` is matched literally by the router: no `{..}` captures and
/// no segment starting with `:` or `*`.
fn is_literal_path(path: &str) -> bool {
    !path.contains(['{', '}'])
        && path
            .split('/')
            .all(|segment| !segment.starts_with([':', '*']))
}

fn serialize_duration<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(&humantime::format_duration(*duration))
}
