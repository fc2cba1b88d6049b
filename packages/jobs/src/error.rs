// ABOUTME: Error types for job submission
// ABOUTME: Distinguishes transport failures from bus-side rejections

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Job submission failed: {0}")]
    Submission(#[from] reqwest::Error),

    #[error("Job bus rejected {job} with status {status}")]
    Rejected { job: String, status: u16 },
}

pub type Result<T> = std::result::Result<T, JobError>;
