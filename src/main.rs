use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use idc_console_api::app::app;
use idc_console_api::config::Config;
use idc_console_api::state::AppState;
use idc_console_api::telemetry::sampler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = Arc::new(Config::from_env());
    tracing::info!("starting IDC console API in {:?} mode", config.environment);

    let state = AppState::new(config.clone());

    // Simulated telemetry feed; a real deployment would wire ingestion
    // events into the hub instead.
    sampler::spawn_simulator(state.hub.clone(), Duration::from_secs(5));

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
