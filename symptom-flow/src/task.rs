use async_trait::async_trait;

use crate::{
    context::{ConversationContext, DialogueState},
    error::Result,
};

/// One user turn, as received and in the form used for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    raw: String,
    normalized: String,
}

impl Turn {
    pub fn new(text: impl Into<String>) -> Self {
        let raw = text.into();
        let normalized = raw.to_lowercase();
        Self { raw, normalized }
    }

    /// The text exactly as the user sent it
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Lower-cased text used for keyword and symptom matching
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.normalized.contains(needle)
    }

    pub fn contains_any<S: AsRef<str>>(&self, needles: &[S]) -> bool {
        needles.iter().any(|needle| self.contains(needle.as_ref()))
    }
}

/// Result of a task execution
#[derive(Debug, Clone)]
pub struct TaskResult {
    /// Response to send to the user
    pub response: Option<String>,
    /// Next action to take
    pub next_action: NextAction,
    /// Context to carry into the next step
    pub context: ConversationContext,
}

impl TaskResult {
    pub fn new(
        response: Option<String>,
        next_action: NextAction,
        context: ConversationContext,
    ) -> Self {
        Self {
            response,
            next_action,
            context,
        }
    }

    /// Reply to the user and wait for the next turn
    pub fn reply(response: impl Into<String>, context: ConversationContext) -> Self {
        Self::new(Some(response.into()), NextAction::WaitForInput, context)
    }

    /// Hand the same turn to the task owning the context's new state
    pub fn fall_through(context: ConversationContext) -> Self {
        Self::new(None, NextAction::ContinueAndExecute, context)
    }

    /// Reply to the user; the conversation has reached its end
    pub fn finish(response: impl Into<String>, context: ConversationContext) -> Self {
        Self::new(Some(response.into()), NextAction::End, context)
    }
}

/// Defines what should happen after a task completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    /// Wait for user input before continuing
    WaitForInput,
    /// Run the task for the new state immediately, on the same turn
    ContinueAndExecute,
    /// The conversation produced its final result
    End,
}

/// Core trait that all dialogue states implement
#[async_trait]
pub trait Task: Send + Sync {
    /// Unique identifier for this task
    fn id(&self) -> &str;

    /// The dialogue state this task handles
    fn state(&self) -> DialogueState;

    /// Handle one turn for the given context
    async fn run(&self, turn: &Turn, context: ConversationContext) -> Result<TaskResult>;
}
