use async_trait::async_trait;
use symptom_flow::{ConversationContext, DialogueState, Result, Task, TaskResult, Turn};
use tracing::info;

pub const WELCOME_MESSAGE: &str = "Namaste! I can help work out what might be causing your symptoms. Please describe how you are feeling.";

/// Opens the conversation. A first message with content is handed straight to
/// symptom gathering on the same turn.
pub struct GreetingTask;

#[async_trait]
impl Task for GreetingTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn state(&self) -> DialogueState {
        DialogueState::Greeting
    }

    async fn run(&self, turn: &Turn, mut context: ConversationContext) -> Result<TaskResult> {
        context.set_state(DialogueState::GatheringSymptoms)?;

        if turn.is_blank() {
            info!(task_id = %self.id(), "Empty first message, sending welcome prompt");
            return Ok(TaskResult::reply(WELCOME_MESSAGE, context));
        }

        Ok(TaskResult::fall_through(context))
    }
}
