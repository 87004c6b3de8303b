use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use risk_assistant_service::{AppState, build_router, init_tracing};
use risk_flow::{AssistantConfig, FlowRunner, InMemorySessionStorage};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AssistantConfig::from_env().context("invalid configuration")?;
    info!(
        prediction_api = %config.prediction.base_url,
        timeout_secs = config.prediction.timeout.as_secs(),
        reply_delay_ms = config.reply_delay.as_millis() as u64,
        imputation_table = ?config.imputation_table,
        session_idle_ttl_secs = config.session_idle_ttl.as_secs(),
        "Loaded configuration"
    );

    let runner = FlowRunner::from_config(&config, Arc::new(InMemorySessionStorage::new()))
        .context("failed to build flow runner")?;
    let sweep_every = config.session_idle_ttl.min(Duration::from_secs(60));
    let _sweeper = runner.spawn_idle_sweeper(config.session_idle_ttl, sweep_every);
    let app = build_router(AppState { runner });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Server running on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
