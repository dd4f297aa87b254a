use symptom_flow::{ConversationContext, DetailQuestion, FlowError, Result};

use crate::vocabulary::humanize;

/// `fever, skin rash` style rendering of symptom ids
pub fn humanize_list<S: AsRef<str>>(symptoms: &[S]) -> String {
    symptoms
        .iter()
        .map(|s| humanize(s.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The question that opens the detail phase
pub fn first_question(context: &ConversationContext) -> Result<DetailQuestion> {
    context.next_unanswered().ok_or_else(|| {
        FlowError::InvariantViolation(
            "entering detail questions with every question already answered".to_string(),
        )
    })
}
