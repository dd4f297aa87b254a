pub mod context;
pub mod error;
pub mod graph;
pub mod runner;
pub mod storage;
pub mod task;

// Re-export commonly used types
pub use context::{ConversationContext, DetailQuestion, DialogueState};
pub use error::{FlowError, Result};
pub use graph::{DialogueGraph, ExecutionResult, ExecutionStatus, GraphBuilder};
pub use runner::FlowRunner;
pub use storage::{InMemorySessionStorage, Session, SessionStorage};
pub use task::{NextAction, Task, TaskResult, Turn};

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_storage() {
        let session_storage = InMemorySessionStorage::new();

        let mut session = Session::new("session1");
        session.context.merge_symptoms(["fever"]);
        session_storage.save(session.clone()).await.unwrap();

        let retrieved = session_storage.get("session1").await.unwrap().unwrap();
        assert_eq!(retrieved.context, session.context);

        session_storage.delete("session1").await.unwrap();
        assert!(session_storage.get("session1").await.unwrap().is_none());
    }

    #[test]
    fn test_turn_normalizes_for_matching() {
        let turn = Turn::new("I Have a FEVER");
        assert_eq!(turn.raw(), "I Have a FEVER");
        assert_eq!(turn.normalized(), "i have a fever");
        assert!(turn.contains("fever"));
        assert!(turn.contains_any(&["cough", "have"]));
        assert!(Turn::new("   ").is_blank());
    }
}
