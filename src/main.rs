// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc, time::Duration};
use anyhow::Context;
use tracing_subscriber::EnvFilter;

use study_dashboard::application::chart_registry::ChartRegistry;
use study_dashboard::application::chart_service::ChartService;
use study_dashboard::infrastructure::config::load_config;
use study_dashboard::infrastructure::study_api::HttpStudyRepository;
use study_dashboard::presentation::app_state::AppState;
use study_dashboard::presentation::routes::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let config = load_config()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(HttpStudyRepository::new(
        &config.backend.base_url,
        Duration::from_secs(config.backend.timeout_secs),
    )?);

    // Chart kinds and the annotation layer are registered once, up front
    let registry = Arc::new(ChartRegistry::standard());

    // Create services (application layer)
    let chart_service = ChartService::new(repository, registry, config.charts);

    let state = Arc::new(AppState { chart_service });
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.listen_addr))?;
    tracing::info!(
        "Starting study-dashboard service on {} (backend {})",
        addr,
        config.backend.base_url
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
