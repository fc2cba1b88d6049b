// ABOUTME: Event-bus submission client behind the JobBus trait
// ABOUTME: HTTP bus for production, in-memory bus for local runs and tests

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{JobError, Result};
use crate::types::{JobAck, JobKind};

/// At-least-once, submit-only channel to the external worker fleet.
/// There is no completion signal; callers treat an `Ok` as "accepted",
/// never "done".
#[async_trait]
pub trait JobBus: Send + Sync {
    async fn submit(&self, job: JobKind, payload: Value) -> Result<JobAck>;
}

#[derive(Deserialize)]
struct SubmissionResponse {
    #[serde(rename = "submissionId")]
    submission_id: Option<String>,
}

/// Submits jobs as JSON over HTTP to the bus endpoint.
pub struct HttpJobBus {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpJobBus {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl JobBus for HttpJobBus {
    async fn submit(&self, job: JobKind, payload: Value) -> Result<JobAck> {
        let body = json!({ "job": job.as_str(), "payload": payload });

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(JobError::Rejected {
                job: job.as_str().to_string(),
                status: response.status().as_u16(),
            });
        }

        let submission_id = response
            .json::<SubmissionResponse>()
            .await
            .ok()
            .and_then(|r| r.submission_id);

        debug!("Submitted job {} (submission: {:?})", job, submission_id);

        Ok(JobAck {
            job: job.as_str().to_string(),
            submission_id,
        })
    }
}

/// A recorded submission, kept in order of arrival.
#[derive(Debug, Clone)]
pub struct RecordedJob {
    pub job: JobKind,
    pub payload: Value,
}

/// In-memory bus used when no endpoint is configured and by tests.
/// Submissions are recorded, never executed.
#[derive(Default)]
pub struct MemoryJobBus {
    submissions: Mutex<Vec<RecordedJob>>,
}

impl MemoryJobBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> Vec<RecordedJob> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobBus for MemoryJobBus {
    async fn submit(&self, job: JobKind, payload: Value) -> Result<JobAck> {
        warn!("No job bus configured; recording {} in memory", job);
        self.submissions
            .lock()
            .unwrap()
            .push(RecordedJob { job, payload });

        Ok(JobAck {
            job: job.as_str().to_string(),
            submission_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_bus_records_in_order() {
        let bus = MemoryJobBus::new();

        bus.submit(JobKind::CreateDesign, json!({"ideaId": "idea-1"}))
            .await
            .unwrap();
        bus.submit(JobKind::RefineIdea, json!({"ideaId": "idea-1"}))
            .await
            .unwrap();

        let recorded = bus.submissions();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].job, JobKind::CreateDesign);
        assert_eq!(recorded[1].job, JobKind::RefineIdea);
        assert_eq!(recorded[0].payload["ideaId"], "idea-1");
    }
}
