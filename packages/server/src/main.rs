// ABOUTME: Inkline server entry point
// ABOUTME: Wires config, database, job bus, and the API router together

use axum::http::Method;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use inkline_api::{app, AppState};
use inkline_jobs::{HttpJobBus, JobBus, MemoryJobBus};

mod config;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let pool = inkline_storage::connect(&config.database_url).await?;

    let bus: Arc<dyn JobBus> = match &config.job_bus_url {
        Some(url) => {
            info!("Dispatching jobs to {}", url);
            Arc::new(HttpJobBus::new(url.clone()))
        }
        None => {
            warn!("{} not set; jobs will be recorded in memory only", config::INKLINE_JOB_BUS_URL);
            Arc::new(MemoryJobBus::new())
        }
    };

    let state = AppState::new(pool, bus);

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<axum::http::HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let router = app(state).layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!("Inkline server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
