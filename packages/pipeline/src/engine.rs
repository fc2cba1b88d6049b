// ABOUTME: The idea stage-advancement engine
// ABOUTME: Validates transitions, commits mutations atomically, then dispatches jobs

use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::buckets::BucketCatalog;
use crate::dispatch::{job_for_stage, REFINE_JOB};
use crate::error::{PipelineError, Result};
use crate::storage::{append_revision, IdeaStorage};
use crate::types::{Bucket, Idea, IdeaStatus, RevisionType, Stage};
use inkline_jobs::{JobAck, JobBus, JobKind};

/// Drives one idea record through the stage graph. Every operation is a
/// single request-scoped call: load, validate, commit the mutation and
/// ledger append in one transaction, then submit the triggered job.
///
/// Dispatch is fire-and-forget. A failed submission surfaces as
/// `Dispatch` while the committed stage/status change stays intact;
/// retry belongs to the bus or an external reconciler, never the engine.
pub struct PipelineEngine {
    pool: SqlitePool,
    ideas: IdeaStorage,
    buckets: BucketCatalog,
    bus: Arc<dyn JobBus>,
}

impl PipelineEngine {
    pub fn new(pool: SqlitePool, bus: Arc<dyn JobBus>) -> Self {
        Self {
            ideas: IdeaStorage::new(pool.clone()),
            buckets: BucketCatalog::new(pool.clone()),
            pool,
            bus,
        }
    }

    pub fn ideas(&self) -> &IdeaStorage {
        &self.ideas
    }

    pub fn buckets(&self) -> &BucketCatalog {
        &self.buckets
    }

    /// Advance an idea to the next stage.
    ///
    /// Validates the transition and the optional destination bucket
    /// before touching anything; commits the stage/status/bucket/ledger
    /// mutation atomically; then dispatches the entered stage's job.
    /// Returns the new stage.
    pub async fn advance(
        &self,
        idea_id: &str,
        next_bucket_id: Option<&str>,
        guidance: Option<&str>,
    ) -> Result<Stage> {
        let idea = self.ideas.get_idea(idea_id).await?;

        let next = idea
            .stage
            .next()
            .ok_or(PipelineError::InvalidTransition { from: idea.stage })?;

        let bucket = match next_bucket_id {
            Some(bucket_id) => {
                let bucket = self.buckets.get(bucket_id).await?;
                if bucket.stage != next {
                    return Err(PipelineError::BucketStageMismatch {
                        bucket_id: bucket_id.to_string(),
                        bucket_stage: bucket.stage,
                        target: next,
                    });
                }
                Some(bucket)
            }
            None => None,
        };

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        match (&bucket, next.bucket_column()) {
            (Some(bucket), Some(column)) => {
                // column names come from the Stage enum, never from input
                let query_str = format!(
                    "UPDATE ideas SET stage = ?, status = ?, {column} = ?, updated_at = ? WHERE id = ?"
                );
                sqlx::query(&query_str)
                    .bind(next)
                    .bind(IdeaStatus::Pending)
                    .bind(&bucket.id)
                    .bind(now)
                    .bind(idea_id)
                    .execute(&mut *tx)
                    .await?;
            }
            _ => {
                sqlx::query(
                    "UPDATE ideas SET stage = ?, status = ?, updated_at = ? WHERE id = ?",
                )
                .bind(next)
                .bind(IdeaStatus::Pending)
                .bind(now)
                .bind(idea_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        // Guidance is tagged with the stage the idea is leaving
        if let Some(notes) = guidance.filter(|n| !n.trim().is_empty()) {
            append_revision(&mut tx, idea_id, idea.stage, RevisionType::Forward, notes, now)
                .await?;
        }

        tx.commit().await?;

        info!("Idea {} advanced {} -> {}", idea_id, idea.stage, next);

        if let Some(job) = job_for_stage(next) {
            self.dispatch(job, transition_payload(idea_id, next, bucket.as_ref()))
                .await?;
        }

        Ok(next)
    }

    /// Reject an idea at its current stage. No ledger entry and no job;
    /// the record simply parks at `rejected` until an operator sends it
    /// somewhere with `send_back`.
    pub async fn reject(&self, idea_id: &str) -> Result<()> {
        let idea = self.ideas.get_idea(idea_id).await?;

        sqlx::query("UPDATE ideas SET status = ?, updated_at = ? WHERE id = ?")
            .bind(IdeaStatus::Rejected)
            .bind(Utc::now())
            .bind(idea_id)
            .execute(&self.pool)
            .await?;

        info!("Idea {} rejected at stage {}", idea_id, idea.stage);

        Ok(())
    }

    /// Request rework of the current (or overridden) stage's artifacts.
    /// The one dispatch that does not follow the stage graph's forward
    /// edge: it submits the fixed refine job instead.
    pub async fn refine(
        &self,
        idea_id: &str,
        notes: &str,
        stage_override: Option<Stage>,
    ) -> Result<JobAck> {
        if notes.trim().is_empty() {
            return Err(PipelineError::Validation(
                "notes must not be empty".to_string(),
            ));
        }

        let idea = self.ideas.get_idea(idea_id).await?;
        let tagged_stage = stage_override.unwrap_or(idea.stage);
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE ideas SET status = ?, updated_at = ? WHERE id = ?")
            .bind(IdeaStatus::Refining)
            .bind(now)
            .bind(idea_id)
            .execute(&mut *tx)
            .await?;

        append_revision(
            &mut tx,
            idea_id,
            tagged_stage,
            RevisionType::Revision,
            notes,
            now,
        )
        .await?;

        tx.commit().await?;

        info!("Idea {} sent for refinement at stage {}", idea_id, tagged_stage);

        self.dispatch(
            REFINE_JOB,
            json!({
                "ideaId": idea_id,
                "stage": tagged_stage,
                "notes": notes,
            }),
        )
        .await
    }

    /// Publish a fully-configured idea: hard-gate the required commerce
    /// fields, mark it processing, and submit the commerce job. The
    /// returned ack means "submitted", not "published".
    pub async fn publish(&self, idea_id: &str) -> Result<JobAck> {
        let idea = self.ideas.get_idea(idea_id).await?;

        if idea.stage != Stage::Publish {
            return Err(PipelineError::WrongStage {
                expected: Stage::Publish,
                actual: idea.stage,
            });
        }

        let missing = missing_publish_fields(&idea);
        if !missing.is_empty() {
            return Err(PipelineError::MissingFields(missing));
        }

        sqlx::query("UPDATE ideas SET status = ?, updated_at = ? WHERE id = ?")
            .bind(IdeaStatus::Processing)
            .bind(Utc::now())
            .bind(idea_id)
            .execute(&self.pool)
            .await?;

        info!("Idea {} queued for commerce product creation", idea_id);

        self.dispatch(
            JobKind::CreateCommerceProduct,
            json!({
                "ideaId": idea_id,
                "commerceCatalogId": idea.commerce_catalog_id,
                "variants": idea.variants,
                "productTitle": idea.product_title,
                "designFileUrl": idea.design_file_url,
                "designTemplateRef": idea.design_template_ref,
            }),
        )
        .await
    }

    /// Move an idea to an arbitrary stage/status outside the forward
    /// state machine (operator "send back"). Records the operator's
    /// notes as a rejection-typed ledger entry when given. No dispatch.
    pub async fn send_back(
        &self,
        idea_id: &str,
        stage: Stage,
        status: IdeaStatus,
        notes: Option<&str>,
    ) -> Result<()> {
        let idea = self.ideas.get_idea(idea_id).await?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE ideas SET stage = ?, status = ?, updated_at = ? WHERE id = ?")
            .bind(stage)
            .bind(status)
            .bind(now)
            .bind(idea_id)
            .execute(&mut *tx)
            .await?;

        if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
            append_revision(
                &mut tx,
                idea_id,
                idea.stage,
                RevisionType::Rejection,
                notes,
                now,
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            "Idea {} sent back {} -> {} ({:?})",
            idea_id, idea.stage, stage, status
        );

        Ok(())
    }

    /// Submit a job, mapping bus errors to `Dispatch`. Called only after
    /// the record mutation has committed.
    async fn dispatch(&self, job: JobKind, payload: serde_json::Value) -> Result<JobAck> {
        match self.bus.submit(job, payload).await {
            Ok(ack) => Ok(ack),
            Err(e) => {
                warn!("Dispatch of {} failed after commit: {}", job, e);
                Err(PipelineError::Dispatch(e))
            }
        }
    }
}

fn transition_payload(idea_id: &str, entered: Stage, bucket: Option<&Bucket>) -> serde_json::Value {
    json!({
        "ideaId": idea_id,
        "stage": entered,
        "bucketId": bucket.map(|b| b.id.clone()),
        "prompt": bucket.map(|b| b.prompt.clone()),
    })
}

/// The publish gate: every required commerce field, with the design
/// reference satisfiable by either a file URL or a design-tool ref.
fn missing_publish_fields(idea: &Idea) -> Vec<String> {
    let mut missing = Vec::new();

    if blank(&idea.commerce_catalog_id) {
        missing.push("commerce_catalog_id".to_string());
    }
    if idea.variants.is_none() {
        missing.push("variants".to_string());
    }
    if blank(&idea.product_title) {
        missing.push("product_title".to_string());
    }
    if blank(&idea.design_file_url) && blank(&idea.design_template_ref) {
        missing.push("design_reference".to_string());
    }

    missing
}

fn blank(field: &Option<String>) -> bool {
    field.as_deref().map_or(true, |s| s.trim().is_empty())
}
