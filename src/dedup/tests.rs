use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::embedding::MockEmbedder;
use crate::scoring::MatchConfidence;
use crate::store::{
    ApprovalState, CorrectionSource, MemoryStore, Metadata, QuestionStore,
};

const FE2O3: &str = "What is the oxidation state of Fe in Fe2O3?";
const FE2O3_PARAPHRASE: &str = "find the oxidation number of Fe in the compound Fe2O3";
const NACL_SOLUBILITY: &str = "What is the solubility of NaCl in water at 25 C?";

type TestEngine = QuestionDeduplicator<Arc<MockEmbedder>, MemoryStore>;

fn engine_with(mock: MockEmbedder, config: DedupConfig) -> (Arc<MockEmbedder>, TestEngine) {
    let mock = Arc::new(mock);
    let engine = QuestionDeduplicator::new(Arc::clone(&mock), MemoryStore::new(), config);
    (mock, engine)
}

fn engine() -> (Arc<MockEmbedder>, TestEngine) {
    engine_with(
        MockEmbedder::new()
            .with_vector(FE2O3, vec![1.0, 0.0, 0.0])
            .with_vector(FE2O3_PARAPHRASE, vec![0.9, 0.3, 0.0])
            .with_vector(NACL_SOLUBILITY, vec![0.0, 1.0, 0.0]),
        DedupConfig::default(),
    )
}

async fn approved_entry(engine: &TestEngine, text: &str, answer: &str) -> i64 {
    let entry = engine
        .prepare_entry(
            text,
            answer,
            None,
            Metadata::new(),
            ApprovalState::approved_now(CorrectionSource::AdminApproval),
        )
        .await
        .expect("should prepare entry");
    engine.store().insert(entry).await.expect("should insert")
}

fn hit(outcome: LookupOutcome) -> QuestionMatch {
    match outcome {
        LookupOutcome::Hit(found) => found,
        LookupOutcome::Miss { .. } => panic!("expected a cache hit"),
    }
}

#[tokio::test]
async fn test_image_hash_hit_skips_embedding() {
    let (mock, engine) = engine();
    let hash = crate::hashing::hash_image_bytes(b"photo of a worksheet");
    let id = engine
        .store()
        .insert(crate::store::NewCachedQuestion {
            question_text: FE2O3.to_string(),
            fingerprint: crate::signature::fingerprint(FE2O3),
            answer: "+3".to_string(),
            embedding: None,
            image_hash: Some(hash.clone()),
            metadata: Metadata::new(),
            approval: ApprovalState::approved_now(CorrectionSource::AdminApproval),
        })
        .await
        .expect("should insert");

    let found = hit(engine.find_similar_question("unreadable ocr text", Some(&hash)).await);
    assert_eq!(found.entry.id, id);
    assert_eq!(found.layer, MatchLayer::ImageHash);
    assert_eq!(found.score, 1.0);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_paraphrase_hits_semantic_layer() {
    let (_mock, engine) = engine();
    let id = approved_entry(&engine, FE2O3, "+3").await;

    let found = hit(engine.find_similar_question(FE2O3_PARAPHRASE, None).await);
    assert_eq!(found.entry.id, id);
    assert_eq!(found.layer, MatchLayer::Semantic);
    assert!(found.score >= engine.config().thresholds.semantic);
    assert_eq!(found.entry.times_used, 2);
}

#[tokio::test]
async fn test_distinct_question_misses() {
    let (_mock, engine) = engine();
    approved_entry(&engine, FE2O3, "+3").await;

    let outcome = engine.find_similar_question(NACL_SOLUBILITY, None).await;
    assert_eq!(outcome, LookupOutcome::miss());
    assert_eq!(outcome.as_header_value(), TITRATE_STATUS_MISS);
}

#[tokio::test]
async fn test_numbered_variant_matches_exact_fingerprint() {
    let (mock, engine) = engine();
    let id = approved_entry(&engine, FE2O3, "+3").await;
    let calls = mock.call_count();

    let found = hit(
        engine
            .find_similar_question("Question 3: What is the oxidation state of Fe in Fe2O3?", None)
            .await,
    );
    assert_eq!(found.entry.id, id);
    assert_eq!(found.layer, MatchLayer::Signature(MatchConfidence::Exact));
    assert_eq!(mock.call_count(), calls);
}

#[tokio::test]
async fn test_choice_formats_match_each_other() {
    let (_mock, engine) = engine();
    let id = approved_entry(
        &engine,
        "Which compound is ionic? (a) NaCl (b) CCl4 (c) CH4 (d) H2O",
        "(a) NaCl",
    )
    .await;

    for variant in [
        "Which compound is ionic? a. NaCl b. CCl4 c. CH4 d. H2O",
        "Which compound is ionic? [a] NaCl [b] CCl4 [c] CH4 [d] H2O",
    ] {
        let found = hit(engine.find_similar_question(variant, None).await);
        assert_eq!(found.entry.id, id);
        assert_eq!(found.layer, MatchLayer::Signature(MatchConfidence::Exact));
    }
}

#[tokio::test]
async fn test_ocr_noise_is_medium_confidence() {
    let (_mock, engine) = engine();
    let id = approved_entry(&engine, FE2O3, "+3").await;

    let found = hit(
        engine
            .find_similar_question("Wnat is the oxidafion state of Fe in Fe2O3?", None)
            .await,
    );
    assert_eq!(found.entry.id, id);
    assert_eq!(found.layer, MatchLayer::Signature(MatchConfidence::Medium));
    assert!(found.layer.is_medium_confidence());
    assert!((found.score - 0.8224).abs() < 1e-3);
}

#[tokio::test]
async fn test_changed_quantity_scores_high() {
    let (_mock, engine) = engine();
    let id = approved_entry(&engine, "Calculate the mass of 2.5 mol NaCl", "146.1 g").await;

    let found = hit(
        engine
            .find_similar_question("Calculate the mass of 3.5 mol NaCl", None)
            .await,
    );
    assert_eq!(found.entry.id, id);
    assert_eq!(found.layer, MatchLayer::Signature(MatchConfidence::High));
}

#[tokio::test]
async fn test_unapproved_entry_shadows_until_approved() {
    let (_mock, engine) = engine();
    let id = engine
        .cache_question(FE2O3, "+2", None, None)
        .await
        .expect("should cache");

    let outcome = engine.find_similar_question(FE2O3, None).await;
    assert!(!outcome.is_hit());
    assert_eq!(outcome.pending_duplicate(), Some(id));

    engine
        .update_cached_answer(id, "+3", CorrectionSource::ManualCorrection)
        .await
        .expect("should approve");

    let found = hit(engine.find_similar_question(FE2O3, None).await);
    assert_eq!(found.entry.id, id);
    assert_eq!(found.entry.answer, "+3");
}

#[tokio::test]
async fn test_pending_pool_entry_reported_as_duplicate() {
    let (_mock, engine) = engine();
    let id = engine
        .cache_question("Calculate the mass of 2.5 mol NaCl", "146.1 g", None, None)
        .await
        .expect("should cache");

    let outcome = engine
        .find_similar_question("Calculate the mass of 3.5 mol NaCl", None)
        .await;
    assert_eq!(
        outcome,
        LookupOutcome::Miss {
            pending_duplicate: Some(id)
        }
    );
}

#[tokio::test]
async fn test_embedding_failure_during_lookup_is_a_miss() {
    let (mock, engine) = engine();
    approved_entry(&engine, FE2O3, "+3").await;
    mock.set_failing(true);

    let outcome = engine.find_similar_question(FE2O3_PARAPHRASE, None).await;
    assert!(!outcome.is_hit());

    // The signature layer does not need the embedder.
    assert!(engine.find_similar_question(FE2O3, None).await.is_hit());
}

#[tokio::test]
async fn test_cache_question_embedding_failure_writes_nothing() {
    let (mock, engine) = engine();
    mock.set_failing(true);

    let err = engine
        .cache_question(FE2O3, "+3", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DedupError::Embedding(_)));
    assert_eq!(engine.get_statistics().await.expect("stats").total_cached, 0);
}

#[tokio::test]
async fn test_cache_question_rejects_empty_text() {
    let (mock, engine) = engine();
    let err = engine.cache_question("   ", "+3", None, None).await.unwrap_err();
    assert!(matches!(err, DedupError::EmptyQuestion));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_cache_question_timeout_writes_nothing() {
    let (mock, engine) = engine_with(
        MockEmbedder::new(),
        DedupConfig {
            embed_timeout: Duration::from_millis(20),
            ..Default::default()
        },
    );
    mock.set_delay(Some(Duration::from_millis(500)));

    let err = engine
        .cache_question(FE2O3, "+3", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DedupError::EmbeddingTimeout { timeout_ms: 20 }));
    assert_eq!(engine.get_statistics().await.expect("stats").total_cached, 0);
}

#[tokio::test]
async fn test_cancelled_cache_question_writes_nothing() {
    let (mock, engine) = engine();
    mock.set_delay(Some(Duration::from_millis(200)));
    let engine = Arc::new(engine);

    let task = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.cache_question(FE2O3, "+3", None, None).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(engine.get_statistics().await.expect("stats").total_cached, 0);
}

#[tokio::test]
async fn test_cache_question_stores_pending_with_metadata() {
    let (_mock, engine) = engine();
    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), serde_json::json!("photo"));
    let hash = "b".repeat(64);

    let id = engine
        .cache_question(FE2O3, "+3", Some(&hash), Some(metadata))
        .await
        .expect("should cache");

    let stored = engine.store().get(id).await.expect("get").expect("exists");
    assert_eq!(stored.approval, ApprovalState::Pending);
    assert_eq!(stored.fingerprint, "what oxidation state fe fe2o3");
    assert_eq!(stored.image_hash.as_deref(), Some(hash.as_str()));
    assert_eq!(stored.embedding, Some(vec![1.0, 0.0, 0.0]));
    assert_eq!(stored.metadata["source"], "photo");
}

#[tokio::test]
async fn test_update_cached_answer_missing_is_not_found() {
    let (_mock, engine) = engine();
    let err = engine
        .update_cached_answer(404, "+3", CorrectionSource::ManualCorrection)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_signature_hit_bumps_usage() {
    let (_mock, engine) = engine();
    let id = approved_entry(&engine, "Calculate the molar mass of H2SO4", "98.08 g/mol").await;

    let found = hit(
        engine
            .find_similar_question("Determine the molar mass of H2SO4 in grams", None)
            .await,
    );
    assert_eq!(found.entry.id, id);
    assert_eq!(found.layer, MatchLayer::Signature(MatchConfidence::Medium));

    let stats = engine.get_statistics().await.expect("stats");
    assert_eq!(stats.total_hits, 2);
}

#[tokio::test]
async fn test_pool_size_limits_scan() {
    let (_mock, engine) = engine_with(
        MockEmbedder::new(),
        DedupConfig {
            pool_size: 1,
            ..Default::default()
        },
    );
    approved_entry(&engine, "Calculate the mass of 2.5 mol NaCl", "146.1 g").await;
    approved_entry(&engine, "What is the pH of pure water?", "7").await;

    // The NaCl entry fell out of the one-entry window.
    let outcome = engine
        .find_similar_question("Calculate the mass of 3.5 mol NaCl", None)
        .await;
    assert!(!outcome.is_hit());
}

#[tokio::test]
async fn test_explain_match_reports_candidates() {
    let (_mock, engine) = engine();
    let id = approved_entry(&engine, FE2O3, "+3").await;
    approved_entry(&engine, NACL_SOLUBILITY, "36 g per 100 mL").await;

    let report = engine
        .explain_match("Question 3: What is the oxidation state of Fe in Fe2O3?", None)
        .await;
    assert_eq!(report.signature.fingerprint, "what oxidation state fe fe2o3");
    assert!(report.outcome.is_hit());
    assert_eq!(report.candidates.len(), 2);
    assert_eq!(report.candidates[0].id, id);
    assert!(report.candidates[0].scores.combined > report.candidates[1].scores.combined);
}

#[tokio::test]
async fn test_explain_match_does_not_count_as_use() {
    let (_mock, engine) = engine();
    let exact = approved_entry(&engine, FE2O3, "+3").await;
    let hash = crate::hashing::hash_image_bytes(b"scan of question 7");
    let by_image = engine
        .store()
        .insert(crate::store::NewCachedQuestion {
            question_text: NACL_SOLUBILITY.to_string(),
            fingerprint: crate::signature::fingerprint(NACL_SOLUBILITY),
            answer: "36 g per 100 mL".to_string(),
            embedding: None,
            image_hash: Some(hash.clone()),
            metadata: Metadata::new(),
            approval: ApprovalState::approved_now(CorrectionSource::AdminApproval),
        })
        .await
        .expect("should insert");

    let image = engine.explain_match("blurry photo", Some(&hash)).await;
    let fingerprint = engine.explain_match(FE2O3, None).await;
    let semantic = engine.explain_match(FE2O3_PARAPHRASE, None).await;

    assert_eq!(image.outcome.as_match().map(|m| m.layer), Some(MatchLayer::ImageHash));
    assert_eq!(
        fingerprint.outcome.as_match().map(|m| m.layer),
        Some(MatchLayer::Signature(MatchConfidence::Exact))
    );
    assert_eq!(semantic.outcome.as_match().map(|m| m.layer), Some(MatchLayer::Semantic));

    for id in [exact, by_image] {
        let entry = engine
            .store()
            .get(id)
            .await
            .expect("should get")
            .expect("should exist");
        assert_eq!(entry.times_used, 1);
    }
    let stats = engine.get_statistics().await.expect("stats");
    assert_eq!(stats.total_hits, 2);
}

#[test]
fn test_match_layer_header_values() {
    assert_eq!(MatchLayer::ImageHash.as_header_value(), "HIT_IMAGE_HASH");
    assert_eq!(
        MatchLayer::Signature(MatchConfidence::High).to_string(),
        "HIT_SIGNATURE_HIGH"
    );
    assert_eq!(MatchLayer::Semantic.as_header_value(), "HIT_SEMANTIC");
}

#[test]
fn test_recency_pool_nearest_embedding_ignores_pending() {
    let now = chrono::Utc::now();
    let make = |id: i64, embedding: Vec<f32>, approval: ApprovalState| crate::store::CachedQuestion {
        id,
        question_text: format!("question {id}"),
        fingerprint: format!("question {id}"),
        answer: "a".to_string(),
        embedding: Some(embedding),
        image_hash: None,
        times_used: 1,
        last_used: now,
        created_at: now,
        approval,
        metadata: Metadata::new(),
    };
    let pool = RecencyPool::from_entries(vec![
        make(1, vec![1.0, 0.0], ApprovalState::Pending),
        make(
            2,
            vec![0.6, 0.8],
            ApprovalState::approved_now(CorrectionSource::AdminApproval),
        ),
    ]);

    let best = pool.nearest_embedding(&[1.0, 0.0]).expect("should find candidate");
    assert_eq!(best.entry.id, 2);
    assert!((best.score - 0.6).abs() < 1e-6);
    assert_eq!(pool.approved().count(), 1);
}
