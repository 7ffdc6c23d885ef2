//! Command line flags.

use std::time::Duration;

use clap::Parser;
use clap::builder::BoolishValueParser;

use crate::config::{DEFAULT_API_URL, DEFAULT_LISTEN_ADDRESS, DEFAULT_TELEMETRY_PATH, ExporterConfig};
use crate::logging::LogFormat;

#[derive(Parser)]
#[command(name = "zlm_exporter", author, version, about = "Prometheus exporter for ZLMediaKit", long_about = None)]
pub struct Cli {
    /// Address to listen on for web interface and telemetry.
    #[arg(long = "web.listen-address", env = "ZLM_EXPORTER_TELEMETRY_ADDRESS", default_value = DEFAULT_LISTEN_ADDRESS)]
    pub listen_address: String,

    /// Path under which to expose metrics.
    #[arg(long = "web.telemetry-path", env = "ZLM_EXPORTER_TELEMETRY_PATH", default_value = DEFAULT_TELEMETRY_PATH)]
    pub telemetry_path: String,

    /// Timeout for requests to ZLMediaKit and for one metrics request.
    #[arg(long = "web.timeout", env = "ZLM_EXPORTER_TIMEOUT", default_value = "15s", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// Verify the TLS certificate of the ZLMediaKit API.
    #[arg(
        long = "web.ssl-verify",
        env = "ZLM_EXPORTER_SSL_VERIFY",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub ssl_verify: bool,

    /// Only export media-server metrics, without exporter build info.
    #[arg(
        long = "web.metric-only",
        env = "ZLM_EXPORTER_METRIC_ONLY",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub metric_only: bool,

    /// Base URL of the ZLMediaKit HTTP API.
    #[arg(long = "zlm.api-url", env = "ZLM_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Secret for the ZLMediaKit HTTP API.
    #[arg(long = "zlm.secret", env = "ZLM_API_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Log level for the exporter.
    #[arg(long = "log.level", env = "ZLM_EXPORTER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(long = "log.format", env = "ZLM_EXPORTER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Logfmt)]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn into_config(self) -> ExporterConfig {
        ExporterConfig {
            listen_address: self.listen_address,
            telemetry_path: self.telemetry_path,
            timeout: self.timeout,
            ssl_verify: self.ssl_verify,
            metric_only: self.metric_only,
            api_url: self.api_url,
            secret: self.secret.unwrap_or_default(),
            log_level: self.log_level,
            log_format: self.log_format,
        }
    }
}
