// ABOUTME: Inkline pipeline library - the idea stage-advancement engine
// ABOUTME: Stage graph, revision ledger, bucket catalog, and job dispatch

pub mod buckets;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod storage;
pub mod types;

pub use buckets::BucketCatalog;
pub use dispatch::job_for_stage;
pub use engine::PipelineEngine;
pub use error::{PipelineError, Result};
pub use storage::IdeaStorage;
pub use types::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::buckets::BucketCatalog;
    pub use crate::engine::PipelineEngine;
    pub use crate::error::{PipelineError, Result};
    pub use crate::storage::IdeaStorage;
    pub use crate::types::{
        Bucket, CreateBucketInput, CreateIdeaInput, Idea, IdeaQueueFilter, IdeaStatus,
        RevisionEntry, RevisionType, Stage, UpdateBucketInput, UpdateIdeaInput,
    };
}
