// ABOUTME: Idea record storage using SQLite
// ABOUTME: CRUD, review-queue filtering, and the transactional revision-ledger append

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::types::{
    CreateIdeaInput, Idea, IdeaQueueFilter, IdeaStatus, RevisionEntry, RevisionType, Stage,
};

pub struct IdeaStorage {
    pool: SqlitePool,
}

impl IdeaStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new idea at stage `phrase`, status `pending`.
    /// A supplied bucket must exist and belong to the phrase stage.
    pub async fn create_idea(&self, input: CreateIdeaInput) -> Result<Idea> {
        if input.phrase_text.trim().is_empty() {
            return Err(PipelineError::Validation(
                "phrase_text must not be empty".to_string(),
            ));
        }

        if let Some(bucket_id) = &input.phrase_bucket_id {
            let stage: Stage = sqlx::query_scalar("SELECT stage FROM buckets WHERE id = ?")
                .bind(bucket_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| PipelineError::BucketNotFound(bucket_id.clone()))?;
            if stage != Stage::Phrase {
                return Err(PipelineError::BucketStageMismatch {
                    bucket_id: bucket_id.clone(),
                    bucket_stage: stage,
                    target: Stage::Phrase,
                });
            }
        }

        let id = format!("idea-{}", nanoid::nanoid!(12));
        let now = Utc::now();

        debug!("Creating idea: {}", id);

        sqlx::query(
            r#"
            INSERT INTO ideas (id, stage, status, phrase_text, phrase_bucket_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(Stage::Phrase)
        .bind(IdeaStatus::Pending)
        .bind(&input.phrase_text)
        .bind(&input.phrase_bucket_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_idea(&id).await
    }

    /// Get a single idea by ID
    pub async fn get_idea(&self, idea_id: &str) -> Result<Idea> {
        let row = sqlx::query("SELECT * FROM ideas WHERE id = ?")
            .bind(idea_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PipelineError::IdeaNotFound(idea_id.to_string()))?;

        row_to_idea(&row)
    }

    /// Patch stage-payload fields. The engine stores these opaquely;
    /// validation belongs to the jobs that produce them.
    pub async fn update_idea(
        &self,
        idea_id: &str,
        input: crate::types::UpdateIdeaInput,
    ) -> Result<Idea> {
        debug!("Updating idea payload: {}", idea_id);

        // Existence check up front so a patch of nothing still 404s
        self.get_idea(idea_id).await?;

        let now = Utc::now();
        let mut updates = vec!["updated_at = ?"];

        if input.phrase_text.is_some() {
            updates.push("phrase_text = ?");
        }
        if input.design_file_url.is_some() {
            updates.push("design_file_url = ?");
        }
        if input.design_template_ref.is_some() {
            updates.push("design_template_ref = ?");
        }
        if input.mockup_urls.is_some() {
            updates.push("mockup_urls = ?");
        }
        if input.commerce_catalog_id.is_some() {
            updates.push("commerce_catalog_id = ?");
        }
        if input.variants.is_some() {
            updates.push("variants = ?");
        }
        if input.product_title.is_some() {
            updates.push("product_title = ?");
        }
        if input.listing_description.is_some() {
            updates.push("listing_description = ?");
        }
        if input.listing_tags.is_some() {
            updates.push("listing_tags = ?");
        }
        if input.publish_product_id.is_some() {
            updates.push("publish_product_id = ?");
        }

        let query_str = format!("UPDATE ideas SET {} WHERE id = ?", updates.join(", "));
        let mut query = sqlx::query(&query_str).bind(now);

        if let Some(text) = input.phrase_text {
            query = query.bind(text);
        }
        if let Some(url) = input.design_file_url {
            query = query.bind(url);
        }
        if let Some(template) = input.design_template_ref {
            query = query.bind(template);
        }
        if let Some(mockups) = input.mockup_urls {
            query = query.bind(serde_json::to_string(&mockups)?);
        }
        if let Some(catalog) = input.commerce_catalog_id {
            query = query.bind(catalog);
        }
        if let Some(variants) = input.variants {
            query = query.bind(serde_json::to_string(&variants)?);
        }
        if let Some(title) = input.product_title {
            query = query.bind(title);
        }
        if let Some(description) = input.listing_description {
            query = query.bind(description);
        }
        if let Some(tags) = input.listing_tags {
            query = query.bind(serde_json::to_string(&tags)?);
        }
        if let Some(product_id) = input.publish_product_id {
            query = query.bind(product_id);
        }

        query = query.bind(idea_id);
        query.execute(&self.pool).await?;

        self.get_idea(idea_id).await
    }

    /// Review-queue read side: filter by stage, status, and/or bucket,
    /// most recently touched first. Consumes engine state; never mutates it.
    pub async fn list_ideas(&self, filter: IdeaQueueFilter) -> Result<Vec<Idea>> {
        let mut conditions = Vec::new();

        if filter.stage.is_some() {
            conditions.push("stage = ?".to_string());
        }
        if filter.status.is_some() {
            conditions.push("status = ?".to_string());
        }
        if filter.bucket_id.is_some() {
            conditions.push(
                "(phrase_bucket_id = ? OR design_bucket_id = ? \
                 OR product_bucket_id = ? OR listing_bucket_id = ?)"
                    .to_string(),
            );
        }

        let mut query_str = String::from("SELECT * FROM ideas");
        if !conditions.is_empty() {
            query_str.push_str(" WHERE ");
            query_str.push_str(&conditions.join(" AND "));
        }
        query_str.push_str(" ORDER BY updated_at DESC");

        let mut query = sqlx::query(&query_str);
        if let Some(stage) = filter.stage {
            query = query.bind(stage);
        }
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(bucket_id) = filter.bucket_id {
            query = query
                .bind(bucket_id.clone())
                .bind(bucket_id.clone())
                .bind(bucket_id.clone())
                .bind(bucket_id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_idea).collect()
    }

    /// Revision ledger for an idea, newest entry first (index 0).
    pub async fn list_revisions(&self, idea_id: &str) -> Result<Vec<RevisionEntry>> {
        let rows = sqlx::query(
            "SELECT stage, entry_type, notes, created_at
             FROM revision_entries WHERE idea_id = ? ORDER BY seq DESC",
        )
        .bind(idea_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(RevisionEntry {
                    stage: row.try_get("stage")?,
                    entry_type: row.try_get("entry_type")?,
                    notes: row.try_get("notes")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

}

/// Append one ledger entry inside the caller's transaction. The sequence
/// number is read and written under the same transaction, so two
/// concurrent mutations of the same idea cannot drop an entry.
pub(crate) async fn append_revision(
    tx: &mut Transaction<'_, Sqlite>,
    idea_id: &str,
    stage: Stage,
    entry_type: RevisionType,
    notes: &str,
    at: DateTime<Utc>,
) -> Result<()> {
    let seq: i64 =
        sqlx::query_scalar("SELECT COALESCE(MAX(seq) + 1, 0) FROM revision_entries WHERE idea_id = ?")
            .bind(idea_id)
            .fetch_one(&mut **tx)
            .await?;

    sqlx::query(
        "INSERT INTO revision_entries (idea_id, seq, stage, entry_type, notes, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(idea_id)
    .bind(seq)
    .bind(stage)
    .bind(entry_type)
    .bind(notes)
    .bind(at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub(crate) fn row_to_idea(row: &SqliteRow) -> Result<Idea> {
    let mockup_urls: Option<String> = row.try_get("mockup_urls")?;
    let variants: Option<String> = row.try_get("variants")?;
    let listing_tags: Option<String> = row.try_get("listing_tags")?;

    let mockup_urls = mockup_urls
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?;
    let variants = variants.as_deref().map(serde_json::from_str).transpose()?;
    let listing_tags = listing_tags
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?;

    Ok(Idea {
        id: row.try_get("id")?,
        stage: row.try_get("stage")?,
        status: row.try_get("status")?,
        phrase_text: row.try_get("phrase_text")?,
        phrase_bucket_id: row.try_get("phrase_bucket_id")?,
        design_bucket_id: row.try_get("design_bucket_id")?,
        design_file_url: row.try_get("design_file_url")?,
        design_template_ref: row.try_get("design_template_ref")?,
        mockup_urls,
        product_bucket_id: row.try_get("product_bucket_id")?,
        commerce_catalog_id: row.try_get("commerce_catalog_id")?,
        variants,
        product_title: row.try_get("product_title")?,
        listing_bucket_id: row.try_get("listing_bucket_id")?,
        listing_description: row.try_get("listing_description")?,
        listing_tags,
        publish_product_id: row.try_get("publish_product_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
