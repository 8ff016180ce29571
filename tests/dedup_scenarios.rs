//! Lookup and review scenarios against both store implementations.

mod common;

use tempfile::TempDir;
use titrate::{
    LookupOutcome, MatchConfidence, MatchLayer, QuestionStore, ReviewState, ReviewWorkflow,
    hash_image_bytes,
};

use common::fixtures::{
    FE2O3, FE2O3_PARAPHRASE, NACL_SOLUBILITY, memory_workflow, scientific, sqlite_workflow,
};

async fn approve_question<E, S>(workflow: &ReviewWorkflow<E, S>, question: &str, answer: &str) -> i64
where
    E: titrate::Embedder,
    S: QuestionStore,
{
    let id = workflow
        .record_interaction(scientific(question, answer))
        .await
        .expect("should record interaction");
    workflow.approve(id).await.expect("should approve")
}

async fn paraphrase_is_served<E: titrate::Embedder, S: QuestionStore>(
    workflow: &ReviewWorkflow<E, S>,
) {
    let cached_id = approve_question(workflow, FE2O3, "+3").await;

    let found = workflow
        .engine()
        .find_similar_question(FE2O3_PARAPHRASE, None)
        .await
        .into_match()
        .expect("paraphrase should hit");
    assert_eq!(found.entry.id, cached_id);
    assert_eq!(found.layer, MatchLayer::Semantic);
    assert_eq!(found.entry.answer, "+3");

    let outcome = workflow
        .engine()
        .find_similar_question(NACL_SOLUBILITY, None)
        .await;
    assert_eq!(outcome, LookupOutcome::miss());
}

#[tokio::test]
async fn test_paraphrase_served_from_memory_store() {
    let (_embedder, workflow) = memory_workflow();
    paraphrase_is_served(&workflow).await;
}

#[tokio::test]
async fn test_paraphrase_served_from_sqlite_store() {
    let dir = TempDir::new().expect("should create temp dir");
    let (_embedder, workflow) = sqlite_workflow(&dir.path().join("titrate.db"));
    paraphrase_is_served(&workflow).await;
}

#[tokio::test]
async fn test_image_duplicate_needs_no_embedding() {
    let dir = TempDir::new().expect("should create temp dir");
    let image = dir.path().join("worksheet.jpg");
    std::fs::write(&image, b"jpeg bytes of a worksheet").expect("should write image");

    let (embedder, workflow) = sqlite_workflow(&dir.path().join("titrate.db"));
    let id = workflow
        .record_interaction(titrate::NewInteraction {
            image_path: Some(image.display().to_string()),
            ..scientific(FE2O3, "+3")
        })
        .await
        .expect("should record");
    let cached_id = workflow.approve(id).await.expect("should approve");

    let calls = embedder.call_count();
    let hash = hash_image_bytes(b"jpeg bytes of a worksheet");
    let found = workflow
        .engine()
        .find_similar_question("OCR garbage", Some(&hash))
        .await
        .into_match()
        .expect("image should hit");
    assert_eq!(found.entry.id, cached_id);
    assert_eq!(found.layer, MatchLayer::ImageHash);
    assert_eq!(embedder.call_count(), calls);
}

#[tokio::test]
async fn test_pending_answer_is_never_served() {
    let dir = TempDir::new().expect("should create temp dir");
    let (_embedder, workflow) = sqlite_workflow(&dir.path().join("titrate.db"));
    let engine = workflow.engine();

    let pending = engine
        .cache_question(FE2O3, "+2", None, None)
        .await
        .expect("should cache");
    let outcome = engine.find_similar_question(FE2O3, None).await;
    assert_eq!(outcome.pending_duplicate(), Some(pending));

    let id = workflow
        .record_interaction(titrate::NewInteraction {
            cached_question_id: Some(pending),
            ..scientific(FE2O3, "+2")
        })
        .await
        .expect("should record");
    workflow.correct(id, "+3", false).await.expect("should correct");

    let found = engine
        .find_similar_question("Question 2: What is the oxidation state of Fe in Fe2O3?", None)
        .await
        .into_match()
        .expect("should hit after approval");
    assert_eq!(found.entry.id, pending);
    assert_eq!(found.layer, MatchLayer::Signature(MatchConfidence::Exact));
    assert_eq!(found.entry.answer, "+3");
}

#[tokio::test]
async fn test_deletion_cascade_survives_reopen() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("titrate.db");

    let (cached_id, interactions) = {
        let (_embedder, workflow) = sqlite_workflow(&path);
        let first = workflow
            .record_interaction(scientific(FE2O3, "+3"))
            .await
            .expect("should record");
        let cached_id = workflow.approve(first).await.expect("should approve");

        let mut interactions = vec![first];
        for _ in 0..2 {
            let id = workflow
                .record_interaction(titrate::NewInteraction {
                    cached_question_id: Some(cached_id),
                    ..scientific(FE2O3, "+3")
                })
                .await
                .expect("should record");
            workflow.approve(id).await.expect("should approve");
            interactions.push(id);
        }

        let report = workflow.delete_cached(cached_id).await.expect("should delete");
        assert_eq!(report.affected_interactions, interactions);
        (cached_id, interactions)
    };

    let (_embedder, workflow) = sqlite_workflow(&path);
    assert!(workflow.cached_question(cached_id).await.is_err());
    for id in interactions {
        let interaction = workflow.interaction(id).await.expect("should exist");
        assert_eq!(interaction.review_state(), ReviewState::Orphaned);
        assert_eq!(interaction.corrected_text, None);
    }
    let unapproved = workflow.unapproved(10).await.expect("should list");
    assert_eq!(unapproved.len(), 3);
}

#[tokio::test]
async fn test_statistics_track_usage() {
    let (_embedder, workflow) = memory_workflow();
    approve_question(&workflow, FE2O3, "+3").await;
    approve_question(&workflow, NACL_SOLUBILITY, "36 g per 100 mL").await;

    for _ in 0..3 {
        assert!(
            workflow
                .engine()
                .find_similar_question(FE2O3, None)
                .await
                .is_hit()
        );
    }

    let stats = workflow.engine().get_statistics().await.expect("stats");
    assert_eq!(stats.total_cached, 2);
    assert_eq!(stats.total_hits, 5);
    assert_eq!(stats.corrected_count, 2);
    assert_eq!(stats.top_questions[0].question_text, FE2O3);
    assert_eq!(stats.top_questions[0].times_used, 4);
}

#[tokio::test]
async fn test_concurrent_lookups_share_one_store() {
    let dir = TempDir::new().expect("should create temp dir");
    let (_embedder, workflow) = sqlite_workflow(&dir.path().join("titrate.db"));
    let cached_id = approve_question(&workflow, FE2O3, "+3").await;

    let engine = workflow.engine();
    let lookups = (0..8).map(|i| {
        let question = if i % 2 == 0 { FE2O3 } else { FE2O3_PARAPHRASE };
        engine.find_similar_question(question, None)
    });
    let outcomes = futures::future::join_all(lookups).await;

    for outcome in &outcomes {
        let found = outcome.as_match().expect("every lookup should hit");
        assert_eq!(found.entry.id, cached_id);
    }
    let entry = workflow
        .cached_question(cached_id)
        .await
        .expect("entry should exist");
    assert_eq!(entry.times_used, 9);
}
