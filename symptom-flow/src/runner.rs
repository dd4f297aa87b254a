//! FlowRunner – loads a session, executes exactly **one** user turn, and persists the
//! updated context back to storage.
//!
//! The dialogue graph itself never holds session state: [`DialogueGraph::execute_turn`]
//! is a function of `(turn, context)`. `FlowRunner` is the convenience layer for callers
//! that keep conversations server-side and only exchange a session id with the user.
//!
//! ```rust,ignore
//! let runner = FlowRunner::new(graph, storage.clone());
//! storage.save(Session::new("abc")).await?;
//! let result = runner.run("abc", "I have a fever").await?;
//! println!("{}", result.response);
//! ```

use std::sync::Arc;
use tracing::info;

use crate::{
    error::{FlowError, Result},
    graph::{DialogueGraph, ExecutionResult},
    storage::SessionStorage,
    task::Turn,
};

/// High-level helper that orchestrates the common _load → execute → save_ pattern.
#[derive(Clone)]
pub struct FlowRunner {
    graph: Arc<DialogueGraph>,
    storage: Arc<dyn SessionStorage>,
}

impl FlowRunner {
    pub fn new(graph: Arc<DialogueGraph>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { graph, storage }
    }

    /// Execute one turn for `session_id` and persist the resulting context.
    ///
    /// On error the stored session is left untouched.
    pub async fn run(&self, session_id: &str, text: &str) -> Result<ExecutionResult> {
        let mut session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))?;

        let result = self
            .graph
            .execute_turn(&Turn::new(text), session.context.clone())
            .await?;

        info!(
            session_id = %session_id,
            state = %result.context.state(),
            status = ?result.status,
            "Turn executed"
        );

        session.context = result.context.clone();
        self.storage.save(session).await?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::{ConversationContext, DialogueState},
        graph::GraphBuilder,
        storage::{InMemorySessionStorage, Session},
        task::{Task, TaskResult},
    };
    use async_trait::async_trait;

    struct CollectTask;

    #[async_trait]
    impl Task for CollectTask {
        fn id(&self) -> &str {
            "collect"
        }

        fn state(&self) -> DialogueState {
            DialogueState::Greeting
        }

        async fn run(&self, turn: &Turn, mut context: ConversationContext) -> Result<TaskResult> {
            context.merge_symptoms([turn.normalized().to_string()]);
            Ok(TaskResult::reply("noted", context))
        }
    }

    #[tokio::test]
    async fn test_runner_persists_context_between_turns() {
        let graph = Arc::new(GraphBuilder::new("test").add_task(Arc::new(CollectTask)).build());
        let storage = Arc::new(InMemorySessionStorage::new());
        storage.save(Session::new("s1")).await.unwrap();

        let runner = FlowRunner::new(graph, storage.clone());
        runner.run("s1", "Fever").await.unwrap();
        runner.run("s1", "cough").await.unwrap();
        runner.run("s1", "fever").await.unwrap();

        let session = storage.get("s1").await.unwrap().unwrap();
        assert_eq!(session.context.collected_symptoms(), ["fever", "cough"]);
    }

    #[tokio::test]
    async fn test_unknown_session_is_an_error() {
        let graph = Arc::new(GraphBuilder::new("test").add_task(Arc::new(CollectTask)).build());
        let runner = FlowRunner::new(graph, Arc::new(InMemorySessionStorage::new()));

        let err = runner.run("missing", "hello").await.unwrap_err();
        assert!(matches!(err, FlowError::SessionNotFound(id) if id == "missing"));
    }
}
