// ABOUTME: HTTP API layer for Inkline providing REST endpoints and routing
// ABOUTME: Integration layer over the pipeline engine and bucket catalog

use axum::{
    routing::{delete, get, post, put},
    Json, Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;

use inkline_jobs::JobBus;
use inkline_pipeline::PipelineEngine;

pub mod buckets_handlers;
pub mod ideas_handlers;
pub mod response;

use response::ApiResponse;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PipelineEngine>,
}

impl AppState {
    pub fn new(pool: SqlitePool, bus: Arc<dyn JobBus>) -> Self {
        let engine = Arc::new(PipelineEngine::new(pool, bus));
        Self { engine }
    }
}

/// Creates the ideas API router
pub fn create_ideas_router() -> Router<AppState> {
    Router::new()
        .route("/", post(ideas_handlers::create_idea))
        .route("/", get(ideas_handlers::list_ideas))
        .route("/{id}", get(ideas_handlers::get_idea))
        .route("/{id}", put(ideas_handlers::update_idea))
        .route("/{id}/revisions", get(ideas_handlers::list_revisions))
        // Stage transitions
        .route("/{id}/advance", post(ideas_handlers::advance_idea))
        .route("/{id}/reject", post(ideas_handlers::reject_idea))
        .route("/{id}/refine", post(ideas_handlers::refine_idea))
        .route("/{id}/publish", post(ideas_handlers::publish_idea))
        .route("/{id}/send-back", post(ideas_handlers::send_back_idea))
}

/// Creates the buckets API router
pub fn create_buckets_router() -> Router<AppState> {
    Router::new()
        .route("/", get(buckets_handlers::list_buckets))
        .route("/", post(buckets_handlers::create_bucket))
        .route("/{id}", put(buckets_handlers::update_bucket))
        .route("/{id}", delete(buckets_handlers::delete_bucket))
}

/// Assemble the full application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/ideas", create_ideas_router())
        .nest("/buckets", create_buckets_router())
        .with_state(state)
}

async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ok"))
}
