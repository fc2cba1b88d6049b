// ABOUTME: Shared API response types and error mapping
// ABOUTME: Provides consistent response format across all API endpoints

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use serde::Serialize;

use inkline_pipeline::PipelineError;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Map pipeline errors to HTTP responses. Dispatch failures get their
/// own status so callers can tell "committed but not dispatched" apart
/// from a rejected request.
pub fn error_response(err: PipelineError) -> Response {
    let status = match &err {
        PipelineError::IdeaNotFound(_) | PipelineError::BucketNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        PipelineError::Validation(_)
        | PipelineError::MissingFields(_)
        | PipelineError::BucketStageMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::InvalidTransition { .. } | PipelineError::WrongStage { .. } => {
            StatusCode::CONFLICT
        }
        PipelineError::Dispatch(_) => StatusCode::BAD_GATEWAY,
        PipelineError::Database(_) | PipelineError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, ResponseJson(ApiResponse::<()>::error(err.to_string()))).into_response()
}

/// 200 with the payload, or the mapped error
pub fn ok_or_error<T: Serialize>(result: Result<T, PipelineError>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, ResponseJson(ApiResponse::success(data))).into_response(),
        Err(err) => error_response(err),
    }
}

/// 201 with the payload, or the mapped error
pub fn created_or_error<T: Serialize>(result: Result<T, PipelineError>) -> Response {
    match result {
        Ok(data) => (StatusCode::CREATED, ResponseJson(ApiResponse::success(data))).into_response(),
        Err(err) => error_response(err),
    }
}
