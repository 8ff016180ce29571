use std::path::Path;
use std::sync::Arc;

use titrate::{
    ChatType, DedupConfig, MemoryStore, MockEmbedder, NewInteraction, QuestionDeduplicator,
    QuestionStore, ReviewWorkflow, SqliteStore,
};

pub const FE2O3: &str = "What is the oxidation state of Fe in Fe2O3?";
pub const FE2O3_PARAPHRASE: &str = "find the oxidation number of Fe in the compound Fe2O3";
pub const NACL_SOLUBILITY: &str = "What is the solubility of NaCl in water at 25 C?";

/// Mock embedder with hand-picked vectors: the paraphrase sits close to
/// `FE2O3`, the solubility question is orthogonal to both.
pub fn scripted_embedder() -> Arc<MockEmbedder> {
    Arc::new(
        MockEmbedder::new()
            .with_vector(FE2O3, vec![1.0, 0.0, 0.0])
            .with_vector(FE2O3_PARAPHRASE, vec![0.9, 0.3, 0.0])
            .with_vector(NACL_SOLUBILITY, vec![0.0, 1.0, 0.0]),
    )
}

pub fn workflow_over<S: QuestionStore>(
    embedder: Arc<MockEmbedder>,
    store: S,
) -> ReviewWorkflow<Arc<MockEmbedder>, S> {
    let engine = QuestionDeduplicator::new(embedder, store, DedupConfig::default());
    ReviewWorkflow::new(Arc::new(engine))
}

pub fn memory_workflow() -> (Arc<MockEmbedder>, ReviewWorkflow<Arc<MockEmbedder>, MemoryStore>) {
    let embedder = scripted_embedder();
    (Arc::clone(&embedder), workflow_over(embedder, MemoryStore::new()))
}

pub fn sqlite_workflow(
    path: &Path,
) -> (Arc<MockEmbedder>, ReviewWorkflow<Arc<MockEmbedder>, SqliteStore>) {
    let embedder = scripted_embedder();
    let store = SqliteStore::open(path).expect("should open sqlite store");
    (Arc::clone(&embedder), workflow_over(embedder, store))
}

pub fn scientific(user_input: &str, bot_response: &str) -> NewInteraction {
    NewInteraction {
        user_id: 1,
        user_input: user_input.to_string(),
        bot_response: bot_response.to_string(),
        chat_type: ChatType::Scientific,
        image_path: None,
        cached_question_id: None,
    }
}
