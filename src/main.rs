use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use healthtools::analytics::Analytics;
use healthtools::api::{AppState, create_router};
use healthtools::config::Config;
use healthtools::messenger::GraphClient;
use healthtools::search::ElasticIndex;

#[derive(Debug, Parser)]
#[command(about = "Messenger echo bot and health registry search proxy")]
struct Cli {
    /// Address to listen on; overrides BIND_ADDR.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let http = config
        .http_client()
        .context("Failed to create HTTP client")?;

    let state = AppState::new(
        config.verify_token.as_str(),
        Arc::new(GraphClient::new(
            http.clone(),
            &config.graph_url,
            &config.page_access_token,
        )),
        Arc::new(ElasticIndex::new(
            http.clone(),
            &config.search_url,
            config.search_result_size,
        )),
        Analytics::new(http, config.ga_tracking_id.clone(), &config.ga_collect_url),
    );

    let bind = cli.bind.unwrap_or(config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!(addr = %bind, "listening");

    axum::serve(
        listener,
        create_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;
    Ok(())
}
