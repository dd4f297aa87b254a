use async_trait::async_trait;
use std::sync::Arc;
use symptom_flow::{ConversationContext, DialogueState, FlowError, Result, Task, TaskResult, Turn};
use tracing::info;

use super::utils::humanize_list;
use crate::{diagnosis::DiagnosisInvoker, precautions::PrecautionTable};

/// Asks the fixed follow-up questions, one answer per turn, then diagnoses
pub struct GatherDetailsTask {
    invoker: Arc<DiagnosisInvoker>,
    precautions: Arc<PrecautionTable>,
}

impl GatherDetailsTask {
    pub fn new(invoker: Arc<DiagnosisInvoker>, precautions: Arc<PrecautionTable>) -> Self {
        Self {
            invoker,
            precautions,
        }
    }

    async fn diagnose(&self, mut context: ConversationContext) -> Result<TaskResult> {
        let diagnosis = self.invoker.diagnose(context.collected_symptoms()).await;
        context.complete_diagnosis(&diagnosis.label, &diagnosis.confidence)?;
        let precautions = self.precautions.lookup(&diagnosis.label);

        info!(
            task_id = %self.id(),
            diagnosis = %diagnosis.label,
            confidence = %diagnosis.confidence,
            "Detail questions answered, diagnosis recorded"
        );

        let response = format!(
            "Thank you. Based on your symptoms ({}) and history, I suspect **{}** (Confidence: {}).\n\n**Precautions:** {}\n\nI am generating your medical report now.",
            humanize_list(context.collected_symptoms()),
            diagnosis.label,
            diagnosis.confidence,
            precautions
        );
        Ok(TaskResult::finish(response, context))
    }
}

#[async_trait]
impl Task for GatherDetailsTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn state(&self) -> DialogueState {
        DialogueState::GatheringDetails
    }

    async fn run(&self, turn: &Turn, mut context: ConversationContext) -> Result<TaskResult> {
        let answered = context.next_unanswered().ok_or_else(|| {
            FlowError::InvariantViolation(
                "GATHERING_DETAILS reached with every detail question answered".to_string(),
            )
        })?;
        context.record_answer(answered, turn.raw());
        info!(task_id = %self.id(), question = answered.key(), "Detail answer recorded");

        match context.next_unanswered() {
            Some(next) => Ok(TaskResult::reply(next.prompt(), context)),
            None => self.diagnose(context).await,
        }
    }
}
