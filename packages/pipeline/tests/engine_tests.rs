// ABOUTME: Integration tests for the stage-advancement engine
// ABOUTME: Exercises transitions, the revision ledger, publish gating, and dispatch

use pretty_assertions::assert_eq;
use std::sync::Arc;

use async_trait::async_trait;
use inkline_jobs::{JobAck, JobBus, JobError, JobKind, MemoryJobBus};
use inkline_pipeline::prelude::*;

async fn setup() -> (PipelineEngine, Arc<MemoryJobBus>) {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    inkline_storage::MIGRATOR.run(&pool).await.unwrap();

    let bus = Arc::new(MemoryJobBus::new());
    let engine = PipelineEngine::new(pool, bus.clone());
    (engine, bus)
}

async fn seed_idea(engine: &PipelineEngine) -> Idea {
    engine
        .ideas()
        .create_idea(CreateIdeaInput {
            phrase_text: "coffee first, questions later".to_string(),
            phrase_bucket_id: None,
        })
        .await
        .unwrap()
}

async fn seed_bucket(engine: &PipelineEngine, stage: Stage, name: &str) -> Bucket {
    engine
        .buckets()
        .create(CreateBucketInput {
            name: name.to_string(),
            stage,
            prompt: format!("{name} directive"),
            is_active: true,
            sort_order: 0,
        })
        .await
        .unwrap()
}

/// A bus that always refuses, for the committed-but-undispatched path.
struct FailingBus;

#[async_trait]
impl JobBus for FailingBus {
    async fn submit(
        &self,
        job: JobKind,
        _payload: serde_json::Value,
    ) -> std::result::Result<JobAck, JobError> {
        Err(JobError::Rejected {
            job: job.as_str().to_string(),
            status: 503,
        })
    }
}

#[tokio::test]
async fn new_idea_starts_at_phrase_pending() {
    let (engine, _bus) = setup().await;
    let idea = seed_idea(&engine).await;

    assert_eq!(idea.stage, Stage::Phrase);
    assert_eq!(idea.status, IdeaStatus::Pending);
    assert!(engine.ideas().list_revisions(&idea.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn advance_walks_the_stage_order_and_resets_status() {
    let (engine, _bus) = setup().await;
    let idea = seed_idea(&engine).await;

    for expected in [Stage::Design, Stage::Product, Stage::Listing, Stage::Publish] {
        let new_stage = engine.advance(&idea.id, None, None).await.unwrap();
        assert_eq!(new_stage, expected);

        let reloaded = engine.ideas().get_idea(&idea.id).await.unwrap();
        assert_eq!(reloaded.stage, expected);
        assert_eq!(reloaded.status, IdeaStatus::Pending);
    }
}

#[tokio::test]
async fn advance_from_publish_is_an_invalid_transition() {
    let (engine, _bus) = setup().await;
    let idea = seed_idea(&engine).await;

    for _ in 0..4 {
        engine.advance(&idea.id, None, None).await.unwrap();
    }

    let err = engine.advance(&idea.id, None, None).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::InvalidTransition {
            from: Stage::Publish
        }
    ));

    let reloaded = engine.ideas().get_idea(&idea.id).await.unwrap();
    assert_eq!(reloaded.stage, Stage::Publish);
}

#[tokio::test]
async fn advance_unknown_idea_is_not_found() {
    let (engine, _bus) = setup().await;

    let err = engine.advance("idea-missing", None, None).await.unwrap_err();
    assert!(matches!(err, PipelineError::IdeaNotFound(_)));
}

#[tokio::test]
async fn advance_with_bucket_and_guidance_scenario() {
    let (engine, bus) = setup().await;
    let idea = seed_idea(&engine).await;
    let bucket = seed_bucket(&engine, Stage::Design, "bold typography").await;

    let new_stage = engine
        .advance(&idea.id, Some(&bucket.id), Some("tighten the hook"))
        .await
        .unwrap();
    assert_eq!(new_stage, Stage::Design);

    let reloaded = engine.ideas().get_idea(&idea.id).await.unwrap();
    assert_eq!(reloaded.stage, Stage::Design);
    assert_eq!(reloaded.status, IdeaStatus::Pending);
    assert_eq!(reloaded.design_bucket_id.as_deref(), Some(bucket.id.as_str()));

    // Guidance is tagged with the pre-transition stage
    let revisions = engine.ideas().list_revisions(&idea.id).await.unwrap();
    assert_eq!(revisions.len(), 1);
    assert_eq!(revisions[0].stage, Stage::Phrase);
    assert_eq!(revisions[0].entry_type, RevisionType::Forward);
    assert_eq!(revisions[0].notes, "tighten the hook");

    let submitted = bus.submissions();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].job, inkline_jobs::JobKind::CreateDesign);
    assert_eq!(submitted[0].payload["ideaId"], idea.id);
    assert_eq!(submitted[0].payload["bucketId"], bucket.id);
    assert_eq!(submitted[0].payload["prompt"], bucket.prompt);
}

#[tokio::test]
async fn advance_rejects_bucket_from_the_wrong_stage() {
    let (engine, bus) = setup().await;
    let idea = seed_idea(&engine).await;
    let bucket = seed_bucket(&engine, Stage::Product, "mugs").await;

    let err = engine
        .advance(&idea.id, Some(&bucket.id), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::BucketStageMismatch {
            bucket_stage: Stage::Product,
            target: Stage::Design,
            ..
        }
    ));

    // Precondition failure: no mutation, no dispatch
    let reloaded = engine.ideas().get_idea(&idea.id).await.unwrap();
    assert_eq!(reloaded.stage, Stage::Phrase);
    assert!(reloaded.design_bucket_id.is_none());
    assert!(bus.submissions().is_empty());
}

#[tokio::test]
async fn advance_into_publish_dispatches_no_job() {
    let (engine, bus) = setup().await;
    let idea = seed_idea(&engine).await;

    engine.advance(&idea.id, None, None).await.unwrap(); // design
    engine.advance(&idea.id, None, None).await.unwrap(); // product
    engine.advance(&idea.id, None, None).await.unwrap(); // listing
    let jobs_before = bus.submissions().len();

    let new_stage = engine.advance(&idea.id, None, None).await.unwrap();
    assert_eq!(new_stage, Stage::Publish);
    assert_eq!(bus.submissions().len(), jobs_before);

    let reloaded = engine.ideas().get_idea(&idea.id).await.unwrap();
    assert_eq!(reloaded.status, IdeaStatus::Pending);
}

#[tokio::test]
async fn concurrent_appends_both_land_in_the_ledger() {
    // File-backed database so both calls contend over real connections
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("inkline.db").display());
    let pool = inkline_storage::connect(&url).await.unwrap();
    let engine = PipelineEngine::new(pool, Arc::new(MemoryJobBus::new()));

    let idea = seed_idea(&engine).await;

    let (a, b) = tokio::join!(
        engine.refine(&idea.id, "tighten the kerning", None),
        engine.refine(&idea.id, "swap the palette", None),
    );
    a.unwrap();
    b.unwrap();

    // Seq is assigned under the appending transaction, so neither entry
    // can overwrite the other
    let revisions = engine.ideas().list_revisions(&idea.id).await.unwrap();
    assert_eq!(revisions.len(), 2);
    let notes: Vec<&str> = revisions.iter().map(|r| r.notes.as_str()).collect();
    assert!(notes.contains(&"tighten the kerning"));
    assert!(notes.contains(&"swap the palette"));
}

#[tokio::test]
async fn corrupt_payload_json_surfaces_a_serialization_error() {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    inkline_storage::MIGRATOR.run(&pool).await.unwrap();
    let engine = PipelineEngine::new(pool.clone(), Arc::new(MemoryJobBus::new()));

    let idea = seed_idea(&engine).await;
    sqlx::query("UPDATE ideas SET mockup_urls = 'not-json' WHERE id = ?")
        .bind(&idea.id)
        .execute(&pool)
        .await
        .unwrap();

    let err = engine.ideas().get_idea(&idea.id).await.unwrap_err();
    assert!(matches!(err, PipelineError::Serialization(_)));
}

#[tokio::test]
async fn ledger_is_append_only_and_newest_first() {
    let (engine, _bus) = setup().await;
    let idea = seed_idea(&engine).await;

    engine.refine(&idea.id, "first pass", None).await.unwrap();
    engine.refine(&idea.id, "second pass", None).await.unwrap();
    engine
        .advance(&idea.id, None, Some("ship it"))
        .await
        .unwrap();

    let revisions = engine.ideas().list_revisions(&idea.id).await.unwrap();
    assert_eq!(revisions.len(), 3);
    assert_eq!(revisions[0].notes, "ship it");
    assert_eq!(revisions[0].entry_type, RevisionType::Forward);
    assert_eq!(revisions[1].notes, "second pass");
    assert_eq!(revisions[2].notes, "first pass");
    assert_eq!(revisions[2].entry_type, RevisionType::Revision);
}

#[tokio::test]
async fn refine_with_empty_notes_fails_without_mutation() {
    let (engine, bus) = setup().await;
    let idea = seed_idea(&engine).await;

    let err = engine.refine(&idea.id, "   ", None).await.unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));

    let reloaded = engine.ideas().get_idea(&idea.id).await.unwrap();
    assert_eq!(reloaded.status, IdeaStatus::Pending);
    assert!(engine.ideas().list_revisions(&idea.id).await.unwrap().is_empty());
    assert!(bus.submissions().is_empty());
}

#[tokio::test]
async fn refine_marks_refining_and_dispatches_the_refine_job() {
    let (engine, bus) = setup().await;
    let idea = seed_idea(&engine).await;
    engine.advance(&idea.id, None, None).await.unwrap(); // design

    let ack = engine
        .refine(&idea.id, "needs warmer colors", None)
        .await
        .unwrap();
    assert_eq!(ack.job, "refine-idea");

    let reloaded = engine.ideas().get_idea(&idea.id).await.unwrap();
    assert_eq!(reloaded.status, IdeaStatus::Refining);
    assert_eq!(reloaded.stage, Stage::Design); // refine never changes stage

    let revisions = engine.ideas().list_revisions(&idea.id).await.unwrap();
    assert_eq!(revisions[0].entry_type, RevisionType::Revision);
    assert_eq!(revisions[0].stage, Stage::Design);

    let submitted = bus.submissions();
    assert_eq!(submitted.last().unwrap().job, JobKind::RefineIdea);
    assert_eq!(submitted.last().unwrap().payload["notes"], "needs warmer colors");
}

#[tokio::test]
async fn refine_honors_the_stage_override_tag() {
    let (engine, _bus) = setup().await;
    let idea = seed_idea(&engine).await;
    engine.advance(&idea.id, None, None).await.unwrap(); // design

    engine
        .refine(&idea.id, "the phrase itself is weak", Some(Stage::Phrase))
        .await
        .unwrap();

    let revisions = engine.ideas().list_revisions(&idea.id).await.unwrap();
    assert_eq!(revisions[0].stage, Stage::Phrase);
}

#[tokio::test]
async fn reject_parks_the_idea_in_place() {
    let (engine, bus) = setup().await;
    let idea = seed_idea(&engine).await;
    engine.advance(&idea.id, None, None).await.unwrap(); // design
    let jobs_before = bus.submissions().len();

    engine.reject(&idea.id).await.unwrap();

    let reloaded = engine.ideas().get_idea(&idea.id).await.unwrap();
    assert_eq!(reloaded.status, IdeaStatus::Rejected);
    assert_eq!(reloaded.stage, Stage::Design);
    assert!(engine.ideas().list_revisions(&idea.id).await.unwrap().is_empty());
    assert_eq!(bus.submissions().len(), jobs_before);
}

#[tokio::test]
async fn publish_requires_the_publish_stage() {
    let (engine, _bus) = setup().await;
    let idea = seed_idea(&engine).await;

    let err = engine.publish(&idea.id).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::WrongStage {
            expected: Stage::Publish,
            actual: Stage::Phrase,
        }
    ));
}

#[tokio::test]
async fn publish_lists_every_missing_field_and_mutates_nothing() {
    let (engine, bus) = setup().await;
    let idea = seed_idea(&engine).await;
    for _ in 0..4 {
        engine.advance(&idea.id, None, None).await.unwrap();
    }
    let jobs_before = bus.submissions().len();

    let err = engine.publish(&idea.id).await.unwrap_err();
    match err {
        PipelineError::MissingFields(fields) => {
            assert_eq!(
                fields,
                vec![
                    "commerce_catalog_id".to_string(),
                    "variants".to_string(),
                    "product_title".to_string(),
                    "design_reference".to_string(),
                ]
            );
        }
        other => panic!("expected MissingFields, got {other:?}"),
    }

    let reloaded = engine.ideas().get_idea(&idea.id).await.unwrap();
    assert_eq!(reloaded.status, IdeaStatus::Pending);
    assert_eq!(bus.submissions().len(), jobs_before);
}

#[tokio::test]
async fn publish_accepts_either_design_reference() {
    let (engine, _bus) = setup().await;
    let idea = seed_idea(&engine).await;
    for _ in 0..4 {
        engine.advance(&idea.id, None, None).await.unwrap();
    }

    engine
        .ideas()
        .update_idea(
            &idea.id,
            UpdateIdeaInput {
                commerce_catalog_id: Some("catalog-384".to_string()),
                variants: Some(serde_json::json!([{"size": "M", "price": 2199}])),
                product_title: Some("Coffee First Tee".to_string()),
                design_template_ref: Some("canva:tpl-99".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    engine.publish(&idea.id).await.unwrap();
}

#[tokio::test]
async fn publish_marks_processing_and_submits_the_commerce_job() {
    let (engine, bus) = setup().await;
    let idea = seed_idea(&engine).await;
    for _ in 0..4 {
        engine.advance(&idea.id, None, None).await.unwrap();
    }

    engine
        .ideas()
        .update_idea(
            &idea.id,
            UpdateIdeaInput {
                commerce_catalog_id: Some("catalog-384".to_string()),
                variants: Some(serde_json::json!([{"size": "M", "price": 2199}])),
                product_title: Some("Coffee First Tee".to_string()),
                design_file_url: Some("https://cdn.example.com/designs/cf-1.png".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let ack = engine.publish(&idea.id).await.unwrap();
    assert_eq!(ack.job, "create-commerce-product");

    let reloaded = engine.ideas().get_idea(&idea.id).await.unwrap();
    assert_eq!(reloaded.status, IdeaStatus::Processing);

    let submitted = bus.submissions();
    let last = submitted.last().unwrap();
    assert_eq!(last.job, JobKind::CreateCommerceProduct);
    assert_eq!(last.payload["productTitle"], "Coffee First Tee");
}

#[tokio::test]
async fn dispatch_failure_surfaces_but_keeps_the_committed_mutation() {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    inkline_storage::MIGRATOR.run(&pool).await.unwrap();
    let engine = PipelineEngine::new(pool, Arc::new(FailingBus));

    let idea = seed_idea(&engine).await;

    let err = engine.advance(&idea.id, None, None).await.unwrap_err();
    assert!(matches!(err, PipelineError::Dispatch(_)));

    // The stage change committed before the submission failed
    let reloaded = engine.ideas().get_idea(&idea.id).await.unwrap();
    assert_eq!(reloaded.stage, Stage::Design);
    assert_eq!(reloaded.status, IdeaStatus::Pending);
}

#[tokio::test]
async fn send_back_moves_the_idea_and_records_the_notes() {
    let (engine, bus) = setup().await;
    let idea = seed_idea(&engine).await;
    engine.advance(&idea.id, None, None).await.unwrap(); // design
    engine.advance(&idea.id, None, None).await.unwrap(); // product
    let jobs_before = bus.submissions().len();

    engine
        .send_back(
            &idea.id,
            Stage::Design,
            IdeaStatus::Pending,
            Some("mockups came out blurry"),
        )
        .await
        .unwrap();

    let reloaded = engine.ideas().get_idea(&idea.id).await.unwrap();
    assert_eq!(reloaded.stage, Stage::Design);
    assert_eq!(reloaded.status, IdeaStatus::Pending);

    let revisions = engine.ideas().list_revisions(&idea.id).await.unwrap();
    assert_eq!(revisions[0].entry_type, RevisionType::Rejection);
    assert_eq!(revisions[0].stage, Stage::Product); // tagged where it was
    assert_eq!(revisions[0].notes, "mockups came out blurry");

    // Send back never dispatches
    assert_eq!(bus.submissions().len(), jobs_before);
}

#[tokio::test]
async fn queue_filters_by_stage_status_and_bucket() {
    let (engine, _bus) = setup().await;
    let bucket = seed_bucket(&engine, Stage::Design, "retro").await;

    let a = seed_idea(&engine).await;
    let b = seed_idea(&engine).await;
    let c = seed_idea(&engine).await;

    engine.advance(&a.id, Some(&bucket.id), None).await.unwrap();
    engine.advance(&b.id, None, None).await.unwrap();
    engine.reject(&b.id).await.unwrap();

    let design_pending = engine
        .ideas()
        .list_ideas(IdeaQueueFilter {
            stage: Some(Stage::Design),
            status: Some(IdeaStatus::Pending),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(design_pending.len(), 1);
    assert_eq!(design_pending[0].id, a.id);

    let in_bucket = engine
        .ideas()
        .list_ideas(IdeaQueueFilter {
            bucket_id: Some(bucket.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(in_bucket.len(), 1);
    assert_eq!(in_bucket[0].id, a.id);

    let phrase_queue = engine
        .ideas()
        .list_ideas(IdeaQueueFilter {
            stage: Some(Stage::Phrase),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(phrase_queue.len(), 1);
    assert_eq!(phrase_queue[0].id, c.id);
}
