use lcp_dashboard::config::init_config;
use lcp_dashboard::errors::{DashError, DashResult};
use lcp_dashboard::server::logging::init_tracing;
use lcp_dashboard::server::{build_router, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> DashResult<()> {
    let config = init_config()?;
    init_tracing(&config.logging);

    let state = AppState::from_config(config)?;
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| DashError::ServerError(format!("failed to bind {addr}: {e}")))?;

    info!(
        %addr,
        oversharing_device_limit = config.dashboard.oversharing_device_limit,
        "lcp-dashboard listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| DashError::ServerError(format!("server error: {e}")))
}
