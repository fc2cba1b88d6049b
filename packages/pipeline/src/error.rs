// ABOUTME: Error types for the pipeline engine
// ABOUTME: Separates precondition failures from post-commit dispatch failures

use thiserror::Error;

use crate::types::Stage;
use inkline_jobs::JobError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Idea not found: {0}")]
    IdeaNotFound(String),

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Invalid transition: {from} has no next stage")]
    InvalidTransition { from: Stage },

    #[error("Wrong stage: expected {expected}, idea is at {actual}")]
    WrongStage { expected: Stage, actual: Stage },

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Bucket {bucket_id} belongs to stage {bucket_stage}, not {target}")]
    BucketStageMismatch {
        bucket_id: String,
        bucket_stage: Stage,
        target: Stage,
    },

    #[error("Invalid input: {0}")]
    Validation(String),

    /// The record mutation committed but the job submission failed.
    /// Callers must NOT treat this as a rollback; the stage/status change
    /// is durable and retrying the dispatch is the bus's concern.
    #[error("Job dispatch failed after commit: {0}")]
    Dispatch(#[from] JobError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
