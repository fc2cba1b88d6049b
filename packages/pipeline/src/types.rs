// ABOUTME: Type definitions for the idea pipeline
// ABOUTME: Stages, statuses, ideas, buckets, revision entries, and input structs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five ordered pipeline stages. Declaration order is the pipeline
/// order, so the derived `Ord` is the stage order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Raw phrase idea awaiting review
    Phrase,
    /// Artwork generation and mockups
    Design,
    /// Variant and pricing configuration
    Product,
    /// Listing copy and storefront metadata
    Listing,
    /// Terminal stage: commerce product creation
    Publish,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Phrase,
        Stage::Design,
        Stage::Product,
        Stage::Listing,
        Stage::Publish,
    ];

    /// The stage immediately after this one; `None` at the terminal stage.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Phrase => Some(Stage::Design),
            Stage::Design => Some(Stage::Product),
            Stage::Product => Some(Stage::Listing),
            Stage::Listing => Some(Stage::Publish),
            Stage::Publish => None,
        }
    }

    /// The idea column holding this stage's bucket assignment.
    /// Publish has no buckets.
    pub fn bucket_column(&self) -> Option<&'static str> {
        match self {
            Stage::Phrase => Some("phrase_bucket_id"),
            Stage::Design => Some("design_bucket_id"),
            Stage::Product => Some("product_bucket_id"),
            Stage::Listing => Some("listing_bucket_id"),
            Stage::Publish => None,
        }
    }

    /// Whether buckets may be created for this stage.
    pub fn owns_buckets(&self) -> bool {
        !matches!(self, Stage::Publish)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Phrase => "phrase",
            Stage::Design => "design",
            Stage::Product => "product",
            Stage::Listing => "listing",
            Stage::Publish => "publish",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review status of an idea, always relative to its current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IdeaStatus {
    /// Awaiting operator review
    Pending,
    /// Operator requested rework; a refine job is in flight
    Refining,
    /// Operator declined the idea at its current stage
    Rejected,
    /// Publish accepted; the commerce job is in flight
    Processing,
}

/// Kind of revision ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RevisionType {
    /// Guidance recorded as the idea advanced out of a stage
    Forward,
    /// Rework notes from a refine request
    Revision,
    /// Notes recorded when an idea was sent back
    Rejection,
}

/// One immutable audit-log record. Entries are never edited or removed;
/// readers receive them newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionEntry {
    pub stage: Stage,
    pub entry_type: RevisionType,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// The unit of work tracked through the five-stage pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    pub id: String,
    pub stage: Stage,
    pub status: IdeaStatus,

    pub phrase_text: String,
    pub phrase_bucket_id: Option<String>,

    pub design_bucket_id: Option<String>,
    pub design_file_url: Option<String>,
    pub design_template_ref: Option<String>,
    pub mockup_urls: Option<Vec<String>>,

    pub product_bucket_id: Option<String>,
    pub commerce_catalog_id: Option<String>,
    pub variants: Option<serde_json::Value>,
    pub product_title: Option<String>,

    pub listing_bucket_id: Option<String>,
    pub listing_description: Option<String>,
    pub listing_tags: Option<Vec<String>>,

    pub publish_product_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Idea {
    /// The bucket assigned for the given stage, if any.
    pub fn bucket_for(&self, stage: Stage) -> Option<&str> {
        match stage {
            Stage::Phrase => self.phrase_bucket_id.as_deref(),
            Stage::Design => self.design_bucket_id.as_deref(),
            Stage::Product => self.product_bucket_id.as_deref(),
            Stage::Listing => self.listing_bucket_id.as_deref(),
            Stage::Publish => None,
        }
    }
}

/// Stage-scoped categorization entry with directive text for generation jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub stage: Stage,
    pub name: String,
    pub prompt: String,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new idea
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIdeaInput {
    pub phrase_text: String,
    pub phrase_bucket_id: Option<String>,
}

/// Payload-field patch for an idea; the engine stores these opaquely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateIdeaInput {
    pub phrase_text: Option<String>,
    pub design_file_url: Option<String>,
    pub design_template_ref: Option<String>,
    pub mockup_urls: Option<Vec<String>>,
    pub commerce_catalog_id: Option<String>,
    pub variants: Option<serde_json::Value>,
    pub product_title: Option<String>,
    pub listing_description: Option<String>,
    pub listing_tags: Option<Vec<String>>,
    pub publish_product_id: Option<String>,
}

/// Input for creating a new bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBucketInput {
    pub name: String,
    pub stage: Stage,
    pub prompt: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i64,
}

fn default_true() -> bool {
    true
}

/// Partial update for a bucket. Stage is fixed at creation; moving a
/// bucket between stages would orphan every idea pointing at it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBucketInput {
    pub name: Option<String>,
    pub prompt: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i64>,
}

/// Read-side filter for the review queue.
#[derive(Debug, Clone, Default)]
pub struct IdeaQueueFilter {
    pub stage: Option<Stage>,
    pub status: Option<IdeaStatus>,
    pub bucket_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_total() {
        assert!(Stage::Phrase < Stage::Design);
        assert!(Stage::Design < Stage::Product);
        assert!(Stage::Product < Stage::Listing);
        assert!(Stage::Listing < Stage::Publish);
    }

    #[test]
    fn next_walks_the_pipeline_and_terminates() {
        let mut stage = Stage::Phrase;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            visited.push(next);
            stage = next;
        }
        assert_eq!(visited, Stage::ALL);
        assert_eq!(Stage::Publish.next(), None);
    }

    #[test]
    fn publish_owns_no_buckets() {
        assert!(Stage::Publish.bucket_column().is_none());
        assert!(!Stage::Publish.owns_buckets());
        for stage in [Stage::Phrase, Stage::Design, Stage::Product, Stage::Listing] {
            assert!(stage.owns_buckets());
            assert!(stage.bucket_column().is_some());
        }
    }

    #[test]
    fn stage_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Stage::Phrase).unwrap(), "\"phrase\"");
        assert_eq!(
            serde_json::to_string(&IdeaStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&RevisionType::Forward).unwrap(),
            "\"forward\""
        );
    }
}
