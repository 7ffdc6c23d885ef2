//! Logging setup.
//!
//! Console output only, either human-readable with local timezone timestamps
//! or one JSON object per line. `RUST_LOG` overrides the configured level.

use std::fmt;

use chrono::Local;
use clap::ValueEnum;
use serde::Serialize;
use tracing_subscriber::{
    EnvFilter,
    fmt::{format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Default log filter directive; `{level}` applies to the exporter's own crates.
pub const DEFAULT_LOG_FILTER: &str = "zlm_exporter={level},zlm_api={level},tower_http={level},hyper=warn,reqwest=warn";

/// Custom timer that uses the local timezone via chrono.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Logfmt,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Logfmt => "logfmt",
            Self::Json => "json",
        })
    }
}

/// Filter directive for `level`, e.g. `debug`.
pub fn filter_directive(level: &str) -> String {
    DEFAULT_LOG_FILTER.replace("{level}", level.trim())
}

/// Build the filter: `RUST_LOG` if set, else the directive for `level`.
pub fn build_filter(level: &str) -> crate::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(filter_directive(level))
        .map_err(|e| crate::Error::config(format!("invalid log level `{level}`: {e}")))
}

/// Install the global subscriber.
pub fn init_logging(level: &str, format: LogFormat) -> crate::Result<()> {
    let filter = build_filter(level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Logfmt => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_timer(LocalTimer),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_timer(LocalTimer),
            )
            .try_init(),
    };

    result.map_err(|e| crate::Error::Other(format!("Failed to set global default subscriber: {}", e)))
}
