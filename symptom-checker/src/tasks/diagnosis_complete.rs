use async_trait::async_trait;
use std::sync::Arc;
use symptom_flow::{ConversationContext, DialogueState, Result, Task, TaskResult, Turn};
use tracing::info;

use crate::config::DialogueSettings;

pub const RESTART_MESSAGE: &str = "Okay, let's start over. Tell me your symptoms.";
pub const REPORT_READY_MESSAGE: &str =
    "Your report has been generated. Please restart if you have new concerns.";

/// Terminal state: the diagnosis stays fixed until the user asks to start again
pub struct DiagnosisCompleteTask {
    settings: Arc<DialogueSettings>,
}

impl DiagnosisCompleteTask {
    pub fn new(settings: Arc<DialogueSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Task for DiagnosisCompleteTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn state(&self) -> DialogueState {
        DialogueState::Diagnosis
    }

    async fn run(&self, turn: &Turn, context: ConversationContext) -> Result<TaskResult> {
        if turn.contains_any(&self.settings.keywords.restart) {
            info!(task_id = %self.id(), "Restarting conversation");
            return Ok(TaskResult::reply(
                RESTART_MESSAGE,
                ConversationContext::restarted(),
            ));
        }

        Ok(TaskResult::reply(REPORT_READY_MESSAGE, context))
    }
}
