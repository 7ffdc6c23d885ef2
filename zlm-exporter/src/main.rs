use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use zlm_api::{Endpoint, ZlmClient};
use zlm_exporter::build_info::BuildInfo;
use zlm_exporter::cli::Cli;
use zlm_exporter::server::{MetricsServer, ServerConfig};
use zlm_exporter::{ZlmCollector, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before flags read their env fallbacks
    dotenvy::dotenv().ok();

    let config = Cli::parse().into_config();
    logging::init_logging(&config.log_level, config.log_format)?;

    let build = BuildInfo::current();
    info!(
        version = %build.version,
        commit = %build.commit,
        build_date = %build.build_date,
        "Starting zlm_exporter"
    );
    info!(
        config = %serde_json::to_string(&config)?,
        secret = %config.masked_secret(),
        "Effective configuration"
    );

    config.validate()?;

    let client = ZlmClient::new(config.client_config())?;
    // Fail at startup rather than on every scrape
    client
        .endpoint_url(Endpoint::Version)
        .context("invalid ZLMediaKit API URL")?;

    let collector = Arc::new(ZlmCollector::new(
        Arc::new(client),
        config.collector_options(),
    )?);

    let server = MetricsServer::new(
        ServerConfig {
            bind_address: config.bind_address()?,
            telemetry_path: config.telemetry_path.clone(),
            timeout: config.timeout,
        },
        collector,
    );

    let cancel_token = server.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
            cancel_token.cancel();
        }
    });

    server.run().await?;

    info!("zlm_exporter stopped");
    Ok(())
}
