use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use contacthub::contacthub_config::AppConfig;
use contacthub::logging::init_tracing;
use contacthub::metrics::{init_metrics, metrics_app};
use contacthub::router::init_router;
use contacthub::state::init_app_state;
use dotenvy::dotenv;

const LIMITER_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;
    init_tracing(&config.server.log_dir).context("failed to initialize logging")?;

    if let Some(handle) = init_metrics(config.server.observability_enabled)? {
        let metrics_addr = config.server.metrics_addr;
        let listener = tokio::net::TcpListener::bind(metrics_addr)
            .await
            .with_context(|| format!("failed to bind metrics listener on {metrics_addr}"))?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                tracing::error!(error = %e, "Metrics server stopped");
            }
        });
        tracing::info!("📊 Metrics available at http://{metrics_addr}/metrics");
    }

    let addr = config.server.addr;
    let state = init_app_state(config)?;

    let limiters = state.limiters.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            limiters.retain_recent();
        }
    });

    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("🚀 Server running on http://{addr}");
    tracing::info!("📚 OpenAPI document at http://{addr}/api-docs/openapi.json");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
