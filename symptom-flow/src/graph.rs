use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    context::{ConversationContext, DialogueState},
    error::{FlowError, Result},
    task::{NextAction, Task, TaskResult, Turn},
};

/// A set of tasks, one per dialogue state, that together drive a conversation
pub struct DialogueGraph {
    pub id: String,
    tasks: DashMap<DialogueState, Arc<dyn Task>>,
}

impl DialogueGraph {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tasks: DashMap::new(),
        }
    }

    /// Register a task for the state it handles, replacing any previous one
    pub fn add_task(&self, task: Arc<dyn Task>) -> &Self {
        self.tasks.insert(task.state(), task);
        self
    }

    /// Get the task handling a state
    pub fn get_task(&self, state: DialogueState) -> Option<Arc<dyn Task>> {
        self.tasks.get(&state).map(|entry| entry.clone())
    }

    /// Execute one user turn.
    ///
    /// Runs the task for the context's current state; a task answering
    /// `ContinueAndExecute` hands the same turn to the task of its new state.
    pub async fn execute_turn(
        &self,
        turn: &Turn,
        context: ConversationContext,
    ) -> Result<ExecutionResult> {
        let mut context = context;
        // Every state may be visited once per turn; more hops means a task loops.
        let max_hops = DialogueState::ALL.len();

        for _ in 0..max_hops {
            let state = context.state();
            let result = self.execute_single_task(state, turn, context).await?;
            debug!(
                graph_id = %self.id,
                from_state = %state,
                to_state = %result.context.state(),
                next_action = ?result.next_action,
                "Task finished"
            );

            match result.next_action {
                NextAction::ContinueAndExecute => {
                    context = result.context;
                }
                NextAction::WaitForInput => {
                    return ExecutionResult::from_task(state, result, ExecutionStatus::WaitingForInput);
                }
                NextAction::End => {
                    info!(graph_id = %self.id, "Conversation reached its final step");
                    return ExecutionResult::from_task(state, result, ExecutionStatus::Completed);
                }
            }
        }

        Err(FlowError::InvariantViolation(format!(
            "turn did not settle after {max_hops} task hops"
        )))
    }

    /// Execute a single task without following ContinueAndExecute actions
    async fn execute_single_task(
        &self,
        state: DialogueState,
        turn: &Turn,
        context: ConversationContext,
    ) -> Result<TaskResult> {
        let task = self
            .get_task(state)
            .ok_or(FlowError::TaskNotFound(state))?;

        debug!(task_id = %task.id(), state = %state, "Running task");
        task.run(turn, context).await
    }
}

/// Builder for creating dialogue graphs
pub struct GraphBuilder {
    graph: DialogueGraph,
}

impl GraphBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            graph: DialogueGraph::new(id),
        }
    }

    pub fn add_task(self, task: Arc<dyn Task>) -> Self {
        self.graph.add_task(task);
        self
    }

    pub fn build(self) -> DialogueGraph {
        self.graph
    }
}

/// Outcome of one executed turn
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub response: String,
    pub context: ConversationContext,
    pub status: ExecutionStatus,
}

impl ExecutionResult {
    fn from_task(
        state: DialogueState,
        result: TaskResult,
        status: ExecutionStatus,
    ) -> Result<Self> {
        let response = result
            .response
            .ok_or_else(|| FlowError::MissingResponse(state.to_string()))?;
        Ok(Self {
            response,
            context: result.context,
            status,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Waiting for user input to continue
    WaitingForInput,
    /// The conversation produced its final result on this turn
    Completed,
}
