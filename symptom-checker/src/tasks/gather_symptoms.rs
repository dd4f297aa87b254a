use async_trait::async_trait;
use std::sync::Arc;
use symptom_flow::{ConversationContext, DialogueState, Result, Task, TaskResult, Turn};
use tracing::info;

use super::utils::{first_question, humanize_list};
use crate::{
    config::DialogueSettings, correlation::CorrelationTable, extractor::SymptomExtractor,
    vocabulary::humanize,
};

pub const NAME_SYMPTOMS_PROMPT: &str = "Please tell me what those symptoms are.";
pub const NO_SYMPTOM_PROMPT: &str = "I didn't catch a specific symptom in that. Could you name the symptom directly? (e.g., 'Headache', 'Fever')";

/// Collects symptoms from free text, offers correlated symptoms, and moves on to the
/// detail questions once enough are known or the user is done.
pub struct GatherSymptomsTask {
    extractor: Arc<dyn SymptomExtractor>,
    correlations: Arc<CorrelationTable>,
    settings: Arc<DialogueSettings>,
}

impl GatherSymptomsTask {
    pub fn new(
        extractor: Arc<dyn SymptomExtractor>,
        correlations: Arc<CorrelationTable>,
        settings: Arc<DialogueSettings>,
    ) -> Self {
        Self {
            extractor,
            correlations,
            settings,
        }
    }

    /// Correlated symptoms of `symptom` the user has not mentioned yet, humanized
    fn suggestions_for(&self, symptom: &str, context: &ConversationContext) -> Vec<String> {
        self.correlations
            .suggestions(symptom, self.settings.suggestion_limit, |partner| {
                context.has_symptom(partner)
            })
            .into_iter()
            .map(humanize)
            .collect()
    }

    fn start_details(
        &self,
        mut context: ConversationContext,
        lead_in: String,
    ) -> Result<TaskResult> {
        context.set_state(DialogueState::GatheringDetails)?;
        let question = first_question(&context)?;
        info!(
            task_id = %self.id(),
            symptoms = context.collected_symptoms().len(),
            "Symptom gathering finished, asking detail questions"
        );
        Ok(TaskResult::reply(
            format!("{lead_in} {}", question.prompt()),
            context,
        ))
    }

    fn with_symptoms(
        &self,
        turn: &Turn,
        mut context: ConversationContext,
        found: Vec<String>,
    ) -> Result<TaskResult> {
        let added = context.merge_symptoms(found.iter().cloned());
        info!(
            task_id = %self.id(),
            found = ?found,
            added = ?added,
            "Symptoms extracted"
        );

        let keywords = &self.settings.keywords;
        if context.collected_symptoms().len() >= self.settings.symptom_threshold
            || turn.contains(&keywords.completion)
        {
            let lead_in = format!(
                "I noted: {}. Now,",
                humanize_list(context.collected_symptoms())
            );
            return self.start_details(context, lead_in);
        }

        let lead = &found[0];
        let suggestions = self.suggestions_for(lead, &context);
        let response = if suggestions.is_empty() {
            format!(
                "I have noted {}. Do you have any other symptoms? (Or say 'that's all')",
                humanize_list(&found)
            )
        } else {
            format!(
                "I noted **{}**. Do you also experience **{}**? (Or tell me what else)",
                humanize(lead),
                suggestions.join(", ")
            )
        };
        Ok(TaskResult::reply(response, context))
    }

    fn without_symptoms(&self, turn: &Turn, context: ConversationContext) -> Result<TaskResult> {
        let keywords = &self.settings.keywords;
        let collected = !context.collected_symptoms().is_empty();

        if collected && turn.contains_any(&keywords.termination) {
            return self.start_details(context, "Okay. Let's get some more details.".to_string());
        }

        if turn.contains_any(&keywords.continuation) {
            return Ok(TaskResult::reply(NAME_SYMPTOMS_PROMPT, context));
        }

        if let Some(last) = context.collected_symptoms().last() {
            let suggestions = self.suggestions_for(last, &context);
            if !suggestions.is_empty() {
                let response = format!(
                    "I'm not sure I understood. Based on **{}**, do you have **{}**?",
                    humanize(last),
                    suggestions.join(", ")
                );
                return Ok(TaskResult::reply(response, context));
            }
        }

        Ok(TaskResult::reply(NO_SYMPTOM_PROMPT, context))
    }
}

#[async_trait]
impl Task for GatherSymptomsTask {
    fn id(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn state(&self) -> DialogueState {
        DialogueState::GatheringSymptoms
    }

    async fn run(&self, turn: &Turn, context: ConversationContext) -> Result<TaskResult> {
        let found = self.extractor.extract(turn.normalized());

        if found.is_empty() {
            self.without_symptoms(turn, context)
        } else {
            self.with_symptoms(turn, context, found)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dataset::CaseRecord, extractor::KeywordExtractor, vocabulary::SymptomVocabulary,
    };

    fn case(symptoms: &[&str]) -> CaseRecord {
        CaseRecord {
            diagnosis: "Any".to_string(),
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn task() -> GatherSymptomsTask {
        let vocabulary = Arc::new(SymptomVocabulary::new([
            "cough", "fatigue", "fever", "headache", "itching", "chills",
        ]));
        let cases = vec![
            case(&["fever", "cough", "fatigue"]),
            case(&["fever", "chills"]),
            case(&["fever", "cough"]),
        ];
        let correlations = CorrelationTable::build(&cases, &vocabulary, 5);
        GatherSymptomsTask::new(
            Arc::new(KeywordExtractor::new(vocabulary)),
            Arc::new(correlations),
            Arc::new(DialogueSettings::default()),
        )
    }

    fn gathering() -> ConversationContext {
        ConversationContext::restarted()
    }

    async fn say(text: &str, context: ConversationContext) -> TaskResult {
        task().run(&Turn::new(text), context).await.unwrap()
    }

    #[tokio::test]
    async fn test_suggests_partners_of_first_new_symptom() {
        let result = say("I have fever", gathering()).await;
        assert_eq!(result.context.collected_symptoms(), ["fever"]);
        assert_eq!(
            result.response.as_deref(),
            Some("I noted **fever**. Do you also experience **cough, fatigue, chills**? (Or tell me what else)")
        );
    }

    #[tokio::test]
    async fn test_collected_symptoms_are_not_suggested() {
        let result = say("fever and cough", gathering()).await;
        let response = result.response.unwrap();
        assert!(response.starts_with("I noted **fever**"));
        assert!(response.contains("**fatigue, chills**"));
    }

    #[tokio::test]
    async fn test_generic_prompt_without_suggestions() {
        let result = say("itching", gathering()).await;
        assert_eq!(
            result.response.as_deref(),
            Some("I have noted itching. Do you have any other symptoms? (Or say 'that's all')")
        );
    }

    #[tokio::test]
    async fn test_threshold_moves_to_details() {
        let result = say("fever, cough and headache", gathering()).await;
        assert_eq!(result.context.state(), DialogueState::GatheringDetails);
        assert_eq!(
            result.response.as_deref(),
            Some("I noted: fever, cough, headache. Now, How is your appetite lately? (Good/Average/Poor)")
        );
    }

    #[tokio::test]
    async fn test_done_with_a_symptom_moves_to_details() {
        let result = say("headache, and i'm done", gathering()).await;
        assert_eq!(result.context.state(), DialogueState::GatheringDetails);
        assert_eq!(result.context.collected_symptoms(), ["headache"]);
    }

    #[tokio::test]
    async fn test_termination_requires_collected_symptoms() {
        let result = say("nothing else", gathering()).await;
        assert_eq!(result.context.state(), DialogueState::GatheringSymptoms);
        assert_eq!(result.response.as_deref(), Some(NO_SYMPTOM_PROMPT));

        let mut context = gathering();
        context.merge_symptoms(["fever"]);
        let result = say("no, that's all", context).await;
        assert_eq!(result.context.state(), DialogueState::GatheringDetails);
        assert_eq!(
            result.response.as_deref(),
            Some("Okay. Let's get some more details. How is your appetite lately? (Good/Average/Poor)")
        );
    }

    #[tokio::test]
    async fn test_continuation_asks_for_names() {
        let result = say("yes", gathering()).await;
        assert_eq!(result.response.as_deref(), Some(NAME_SYMPTOMS_PROMPT));

        let result = say("avunu", gathering()).await;
        assert_eq!(result.response.as_deref(), Some(NAME_SYMPTOMS_PROMPT));
    }

    #[tokio::test]
    async fn test_unclear_turn_falls_back_to_last_symptom() {
        let mut context = gathering();
        context.merge_symptoms(["chills", "fever"]);
        let result = say("hmm, maybe", context).await;
        assert_eq!(
            result.response.as_deref(),
            Some("I'm not sure I understood. Based on **fever**, do you have **cough, fatigue**?")
        );
        assert_eq!(result.context.state(), DialogueState::GatheringSymptoms);
    }

    #[tokio::test]
    async fn test_repeated_mentions_do_not_duplicate() {
        let first = say("fever", gathering()).await;
        let second = say("my fever got worse", first.context).await;
        assert_eq!(second.context.collected_symptoms(), ["fever"]);
    }
}
