use letters_dashboard::{
    dashboard, models::FilterState, router, ApiClient, AppState, DashboardConfig,
};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = DashboardConfig::from_env();
    let state = AppState::new(ApiClient::new(config.api_base), FilterState::default());
    info!(api_base = %state.client.base_url(), "using backend");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Initial load, the same cycle the Apply button runs.
    let initial = state.clone();
    tokio::spawn(async move {
        let filter = initial.dashboard.lock().await.filter.clone();
        let outcome = dashboard::load(&initial.client, &initial.dashboard, &filter).await;
        if !outcome.is_complete() {
            warn!(failed = outcome.failures.len(), "initial load was incomplete");
        }
    });

    let app = router(state);

    info!("listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
