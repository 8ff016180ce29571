use std::sync::Arc;

use titrate::{Embedder, QuestionDeduplicator, QuestionStore, ReviewWorkflow};

/// Shared handler state: the review workflow and, through it, the lookup engine.
pub struct HandlerState<E: Embedder, S: QuestionStore> {
    pub workflow: Arc<ReviewWorkflow<E, S>>,
}

impl<E: Embedder, S: QuestionStore> Clone for HandlerState<E, S> {
    fn clone(&self) -> Self {
        Self {
            workflow: Arc::clone(&self.workflow),
        }
    }
}

impl<E, S> HandlerState<E, S>
where
    E: Embedder + 'static,
    S: QuestionStore + 'static,
{
    pub fn new(workflow: ReviewWorkflow<E, S>) -> Self {
        Self {
            workflow: Arc::new(workflow),
        }
    }

    pub fn engine(&self) -> &QuestionDeduplicator<E, S> {
        self.workflow.engine()
    }

    pub fn is_embedder_stub(&self) -> bool {
        self.engine().embedder().is_stub()
    }
}
