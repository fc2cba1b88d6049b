// ABOUTME: HTTP request handlers for idea lifecycle and stage transitions
// ABOUTME: Create/read/patch ideas, the review queue, and the engine operations

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::response::{created_or_error, ok_or_error};
use super::AppState;
use inkline_pipeline::{
    CreateIdeaInput, IdeaQueueFilter, IdeaStatus, Stage, UpdateIdeaInput,
};

/// Request body for creating an idea
#[derive(Deserialize)]
pub struct CreateIdeaRequest {
    #[serde(rename = "phraseText")]
    pub phrase_text: String,
    #[serde(rename = "phraseBucketId")]
    pub phrase_bucket_id: Option<String>,
}

/// Create a new idea at the phrase stage
pub async fn create_idea(
    State(state): State<AppState>,
    Json(request): Json<CreateIdeaRequest>,
) -> impl IntoResponse {
    info!("Creating idea");

    let result = state
        .engine
        .ideas()
        .create_idea(CreateIdeaInput {
            phrase_text: request.phrase_text,
            phrase_bucket_id: request.phrase_bucket_id,
        })
        .await;
    created_or_error(result)
}

/// Query parameters for the review queue
#[derive(Deserialize)]
pub struct QueueQuery {
    pub stage: Option<Stage>,
    pub status: Option<IdeaStatus>,
    #[serde(rename = "bucketId")]
    pub bucket_id: Option<String>,
}

/// List ideas for the review queue, filtered by stage/status/bucket
pub async fn list_ideas(
    State(state): State<AppState>,
    Query(query): Query<QueueQuery>,
) -> impl IntoResponse {
    let result = state
        .engine
        .ideas()
        .list_ideas(IdeaQueueFilter {
            stage: query.stage,
            status: query.status,
            bucket_id: query.bucket_id,
        })
        .await;
    ok_or_error(result)
}

/// Get an idea by ID
pub async fn get_idea(
    State(state): State<AppState>,
    Path(idea_id): Path<String>,
) -> impl IntoResponse {
    let result = state.engine.ideas().get_idea(&idea_id).await;
    ok_or_error(result)
}

/// Request body for patching an idea's payload fields
#[derive(Deserialize, Default)]
pub struct UpdateIdeaRequest {
    #[serde(rename = "phraseText")]
    pub phrase_text: Option<String>,
    #[serde(rename = "designFileUrl")]
    pub design_file_url: Option<String>,
    #[serde(rename = "designTemplateRef")]
    pub design_template_ref: Option<String>,
    #[serde(rename = "mockupUrls")]
    pub mockup_urls: Option<Vec<String>>,
    #[serde(rename = "commerceCatalogId")]
    pub commerce_catalog_id: Option<String>,
    pub variants: Option<serde_json::Value>,
    #[serde(rename = "productTitle")]
    pub product_title: Option<String>,
    #[serde(rename = "listingDescription")]
    pub listing_description: Option<String>,
    #[serde(rename = "listingTags")]
    pub listing_tags: Option<Vec<String>>,
    #[serde(rename = "publishProductId")]
    pub publish_product_id: Option<String>,
}

/// Patch an idea's stage-payload fields
pub async fn update_idea(
    State(state): State<AppState>,
    Path(idea_id): Path<String>,
    Json(request): Json<UpdateIdeaRequest>,
) -> impl IntoResponse {
    info!("Updating idea: {}", idea_id);

    let input = UpdateIdeaInput {
        phrase_text: request.phrase_text,
        design_file_url: request.design_file_url,
        design_template_ref: request.design_template_ref,
        mockup_urls: request.mockup_urls,
        commerce_catalog_id: request.commerce_catalog_id,
        variants: request.variants,
        product_title: request.product_title,
        listing_description: request.listing_description,
        listing_tags: request.listing_tags,
        publish_product_id: request.publish_product_id,
    };

    let result = state.engine.ideas().update_idea(&idea_id, input).await;
    ok_or_error(result)
}

/// Revision ledger for an idea, newest entry first
pub async fn list_revisions(
    State(state): State<AppState>,
    Path(idea_id): Path<String>,
) -> impl IntoResponse {
    let result = state.engine.ideas().list_revisions(&idea_id).await;
    ok_or_error(result)
}

/// Request body for advancing an idea
#[derive(Deserialize, Default)]
pub struct AdvanceRequest {
    #[serde(rename = "nextBucketId")]
    pub next_bucket_id: Option<String>,
    pub guidance: Option<String>,
}

/// Advance an idea to the next stage
pub async fn advance_idea(
    State(state): State<AppState>,
    Path(idea_id): Path<String>,
    request: Option<Json<AdvanceRequest>>,
) -> impl IntoResponse {
    info!("Advancing idea: {}", idea_id);

    let Json(request) = request.unwrap_or_default();
    let result = state
        .engine
        .advance(
            &idea_id,
            request.next_bucket_id.as_deref(),
            request.guidance.as_deref(),
        )
        .await;
    ok_or_error(result)
}

/// Reject an idea at its current stage
pub async fn reject_idea(
    State(state): State<AppState>,
    Path(idea_id): Path<String>,
) -> impl IntoResponse {
    info!("Rejecting idea: {}", idea_id);

    let result = state.engine.reject(&idea_id).await;
    ok_or_error(result)
}

/// Request body for a refine request
#[derive(Deserialize)]
pub struct RefineRequest {
    pub notes: String,
    #[serde(rename = "stageOverride")]
    pub stage_override: Option<Stage>,
}

/// Request rework of the idea's current stage artifacts
pub async fn refine_idea(
    State(state): State<AppState>,
    Path(idea_id): Path<String>,
    Json(request): Json<RefineRequest>,
) -> impl IntoResponse {
    info!("Refining idea: {}", idea_id);

    let result = state
        .engine
        .refine(&idea_id, &request.notes, request.stage_override)
        .await;
    ok_or_error(result)
}

/// Publish a fully-configured idea to the commerce provider
pub async fn publish_idea(
    State(state): State<AppState>,
    Path(idea_id): Path<String>,
) -> impl IntoResponse {
    info!("Publishing idea: {}", idea_id);

    let result = state.engine.publish(&idea_id).await;
    ok_or_error(result)
}

/// Request body for sending an idea back to an earlier stage
#[derive(Deserialize)]
pub struct SendBackRequest {
    pub stage: Stage,
    pub status: Option<IdeaStatus>,
    pub notes: Option<String>,
}

/// Move an idea outside the forward state machine (operator convenience)
pub async fn send_back_idea(
    State(state): State<AppState>,
    Path(idea_id): Path<String>,
    Json(request): Json<SendBackRequest>,
) -> impl IntoResponse {
    info!("Sending idea back: {} -> {}", idea_id, request.stage);

    let result = state
        .engine
        .send_back(
            &idea_id,
            request.stage,
            request.status.unwrap_or(IdeaStatus::Pending),
            request.notes.as_deref(),
        )
        .await;
    ok_or_error(result)
}
