use thiserror::Error;

use crate::context::DialogueState;

/// Errors raised while driving a conversation turn
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("No task registered for state: {0}")]
    TaskNotFound(DialogueState),

    #[error("Task execution failed: {0}")]
    TaskExecutionFailed(String),

    #[error("Dialogue invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Invalid conversation context: {0}")]
    InvalidContext(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Task {0} finished the turn without a response")]
    MissingResponse(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
