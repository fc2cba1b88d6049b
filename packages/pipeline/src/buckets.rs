// ABOUTME: Bucket catalog with CRUD operations
// ABOUTME: Stage-scoped categorization entries consumed by generation jobs

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::types::{Bucket, CreateBucketInput, Stage, UpdateBucketInput};

/// SQL ordering that follows pipeline stage order rather than the
/// alphabetical order of the TEXT column.
const STAGE_ORDER_SQL: &str = "CASE stage \
     WHEN 'phrase' THEN 0 WHEN 'design' THEN 1 \
     WHEN 'product' THEN 2 WHEN 'listing' THEN 3 ELSE 4 END";

pub struct BucketCatalog {
    pool: SqlitePool,
}

impl BucketCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a single bucket by ID
    pub async fn get(&self, bucket_id: &str) -> Result<Bucket> {
        let row = sqlx::query("SELECT * FROM buckets WHERE id = ?")
            .bind(bucket_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PipelineError::BucketNotFound(bucket_id.to_string()))?;

        row_to_bucket(&row)
    }

    /// List buckets, optionally scoped to one stage, ordered by
    /// (stage, sort_order, name). Includes inactive buckets so existing
    /// assignments stay resolvable.
    pub async fn list(&self, stage: Option<Stage>) -> Result<Vec<Bucket>> {
        let rows = match stage {
            Some(stage) => {
                sqlx::query("SELECT * FROM buckets WHERE stage = ? ORDER BY sort_order, name")
                    .bind(stage)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query_str = format!(
                    "SELECT * FROM buckets ORDER BY {STAGE_ORDER_SQL}, sort_order, name"
                );
                sqlx::query(&query_str).fetch_all(&self.pool).await?
            }
        };

        rows.iter().map(row_to_bucket).collect()
    }

    /// Active buckets for one stage, for new-assignment pickers. Ideas
    /// already pointing at a deactivated bucket keep their reference.
    pub async fn list_active(&self, stage: Stage) -> Result<Vec<Bucket>> {
        let rows = sqlx::query(
            "SELECT * FROM buckets WHERE stage = ? AND is_active = 1 ORDER BY sort_order, name",
        )
        .bind(stage)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_bucket).collect()
    }

    /// Create a bucket. Name and prompt must be non-empty and the stage
    /// must be one of the four pre-publish stages.
    pub async fn create(&self, input: CreateBucketInput) -> Result<Bucket> {
        if input.name.trim().is_empty() {
            return Err(PipelineError::Validation(
                "name must not be empty".to_string(),
            ));
        }
        if input.prompt.trim().is_empty() {
            return Err(PipelineError::Validation(
                "prompt must not be empty".to_string(),
            ));
        }
        if !input.stage.owns_buckets() {
            return Err(PipelineError::Validation(format!(
                "stage {} has no buckets",
                input.stage
            )));
        }

        let id = format!("bucket-{}", nanoid::nanoid!(12));
        let now = Utc::now();

        debug!("Creating bucket: {} ({})", id, input.stage);

        sqlx::query(
            r#"
            INSERT INTO buckets (id, stage, name, prompt, is_active, sort_order, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(input.stage)
        .bind(&input.name)
        .bind(&input.prompt)
        .bind(input.is_active)
        .bind(input.sort_order)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(&id).await
    }

    /// Partial update of a bucket's fields
    pub async fn update(&self, bucket_id: &str, input: UpdateBucketInput) -> Result<Bucket> {
        debug!("Updating bucket: {}", bucket_id);

        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(PipelineError::Validation(
                    "name must not be empty".to_string(),
                ));
            }
        }
        if let Some(prompt) = &input.prompt {
            if prompt.trim().is_empty() {
                return Err(PipelineError::Validation(
                    "prompt must not be empty".to_string(),
                ));
            }
        }

        // Existence check so a no-op patch still reports NotFound
        self.get(bucket_id).await?;

        let now = Utc::now();
        let mut updates = vec!["updated_at = ?"];

        if input.name.is_some() {
            updates.push("name = ?");
        }
        if input.prompt.is_some() {
            updates.push("prompt = ?");
        }
        if input.is_active.is_some() {
            updates.push("is_active = ?");
        }
        if input.sort_order.is_some() {
            updates.push("sort_order = ?");
        }

        let query_str = format!("UPDATE buckets SET {} WHERE id = ?", updates.join(", "));
        let mut query = sqlx::query(&query_str).bind(now);

        if let Some(name) = input.name {
            query = query.bind(name);
        }
        if let Some(prompt) = input.prompt {
            query = query.bind(prompt);
        }
        if let Some(is_active) = input.is_active {
            query = query.bind(is_active);
        }
        if let Some(sort_order) = input.sort_order {
            query = query.bind(sort_order);
        }

        query = query.bind(bucket_id);
        query.execute(&self.pool).await?;

        self.get(bucket_id).await
    }

    /// Delete a bucket. Refused while any idea slot still references it;
    /// deactivate instead to retire a bucket that has history.
    pub async fn delete(&self, bucket_id: &str) -> Result<()> {
        self.get(bucket_id).await?;

        let references: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM ideas
             WHERE phrase_bucket_id = ? OR design_bucket_id = ?
                OR product_bucket_id = ? OR listing_bucket_id = ?",
        )
        .bind(bucket_id)
        .bind(bucket_id)
        .bind(bucket_id)
        .bind(bucket_id)
        .fetch_one(&self.pool)
        .await?;

        if references > 0 {
            return Err(PipelineError::Validation(format!(
                "bucket {bucket_id} is referenced by {references} idea(s); deactivate it instead"
            )));
        }

        debug!("Deleting bucket: {}", bucket_id);

        sqlx::query("DELETE FROM buckets WHERE id = ?")
            .bind(bucket_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn row_to_bucket(row: &SqliteRow) -> Result<Bucket> {
    Ok(Bucket {
        id: row.try_get("id")?,
        stage: row.try_get("stage")?,
        name: row.try_get("name")?,
        prompt: row.try_get("prompt")?,
        is_active: row.try_get("is_active")?,
        sort_order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
