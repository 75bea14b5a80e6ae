//! HTTP server setup and routing for the package feed.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{api, config::Config, state::AppState, validation};

/// All feed routes over the given state.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_request_body_size_bytes();

    Router::new()
        .route("/health", get(api::health))
        .route("/status", get(api::status))
        .route("/api/v2/package", put(api::push_package))
        .route("/api/packages", get(api::search))
        .route("/api/packages/{id}/versions", get(api::package_versions))
        .route("/api/packages/{id}/{version}", get(api::get_package))
        .route("/api/packages/{id}/{version}/download", get(api::download))
        .route("/api/catalog", get(api::get_packages))
        .route("/api/catalog/reload", post(api::reload))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

pub async fn run_server(host: String, port: u16, data_dir: PathBuf, config: Config) -> Result<()> {
    info!("Starting package feed");

    validation::validate_hostname(&host).map_err(|e| {
        error!(host = %host, error = %e, "Invalid host parameter");
        anyhow::anyhow!("Invalid host parameter: {e}")
    })?;

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
    let data_dir = std::fs::canonicalize(&data_dir)
        .with_context(|| format!("Failed to resolve data directory {}", data_dir.display()))?;
    info!(data_dir = %data_dir.display(), "Using data directory");

    let server_addr = format!("http://{host}:{port}");
    let app = build_router(AppState::new(data_dir.clone(), server_addr, config));

    let addr: SocketAddr = format!("{host}:{port}").parse().map_err(|e| {
        error!(host = %host, port = %port, error = %e, "Invalid socket address");
        anyhow::anyhow!("Invalid socket address {host}:{port}: {e}")
    })?;

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    println!("✅ Package feed running on http://{addr}");
    println!("📂 Data directory: {}", data_dir.display());
    println!();
    println!("📋 Quick commands:");
    println!("   Push:    feed-server push MyPackage.1.0.0.nupkg --server http://localhost:{port}");
    println!("   Search:  curl 'http://localhost:{port}/api/packages?q=my'");
    println!("   Health:  curl http://localhost:{port}/health");

    info!(%addr, "Package feed listening");
    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
