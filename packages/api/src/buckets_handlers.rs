// ABOUTME: HTTP request handlers for bucket catalog administration
// ABOUTME: List, create, update, and delete stage-scoped buckets

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::response::{created_or_error, ok_or_error};
use super::AppState;
use inkline_pipeline::{CreateBucketInput, Stage, UpdateBucketInput};

/// Query parameters for listing buckets
#[derive(Deserialize)]
pub struct ListBucketsQuery {
    pub stage: Option<Stage>,
    /// Restrict to active buckets (new-assignment pickers)
    #[serde(rename = "activeOnly", default)]
    pub active_only: bool,
}

/// List buckets, optionally scoped to a stage
pub async fn list_buckets(
    State(state): State<AppState>,
    Query(query): Query<ListBucketsQuery>,
) -> impl IntoResponse {
    let catalog = state.engine.buckets();
    let result = match (query.active_only, query.stage) {
        (true, Some(stage)) => catalog.list_active(stage).await,
        _ => catalog.list(query.stage).await,
    };
    ok_or_error(result)
}

/// Request body for creating a bucket
#[derive(Deserialize)]
pub struct CreateBucketRequest {
    pub name: String,
    pub stage: Stage,
    pub prompt: String,
    #[serde(rename = "isActive")]
    pub is_active: Option<bool>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<i64>,
}

/// Create a new bucket
pub async fn create_bucket(
    State(state): State<AppState>,
    Json(request): Json<CreateBucketRequest>,
) -> impl IntoResponse {
    info!("Creating bucket: {} ({})", request.name, request.stage);

    let result = state
        .engine
        .buckets()
        .create(CreateBucketInput {
            name: request.name,
            stage: request.stage,
            prompt: request.prompt,
            is_active: request.is_active.unwrap_or(true),
            sort_order: request.sort_order.unwrap_or(0),
        })
        .await;
    created_or_error(result)
}

/// Request body for updating a bucket
#[derive(Deserialize, Default)]
pub struct UpdateBucketRequest {
    pub name: Option<String>,
    pub prompt: Option<String>,
    #[serde(rename = "isActive")]
    pub is_active: Option<bool>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<i64>,
}

/// Partially update a bucket
pub async fn update_bucket(
    State(state): State<AppState>,
    Path(bucket_id): Path<String>,
    Json(request): Json<UpdateBucketRequest>,
) -> impl IntoResponse {
    info!("Updating bucket: {}", bucket_id);

    let result = state
        .engine
        .buckets()
        .update(
            &bucket_id,
            UpdateBucketInput {
                name: request.name,
                prompt: request.prompt,
                is_active: request.is_active,
                sort_order: request.sort_order,
            },
        )
        .await;
    ok_or_error(result)
}

/// Delete a bucket. Refused while ideas still reference it.
pub async fn delete_bucket(
    State(state): State<AppState>,
    Path(bucket_id): Path<String>,
) -> impl IntoResponse {
    info!("Deleting bucket: {}", bucket_id);

    let result = state.engine.buckets().delete(&bucket_id).await;
    ok_or_error(result)
}
