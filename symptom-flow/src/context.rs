use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{FlowError, Result};

/// Where a conversation currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DialogueState {
    #[default]
    Greeting,
    GatheringSymptoms,
    GatheringDetails,
    Diagnosis,
}

impl DialogueState {
    pub const ALL: [DialogueState; 4] = [
        DialogueState::Greeting,
        DialogueState::GatheringSymptoms,
        DialogueState::GatheringDetails,
        DialogueState::Diagnosis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueState::Greeting => "GREETING",
            DialogueState::GatheringSymptoms => "GATHERING_SYMPTOMS",
            DialogueState::GatheringDetails => "GATHERING_DETAILS",
            DialogueState::Diagnosis => "DIAGNOSIS",
        }
    }
}

impl fmt::Display for DialogueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Follow-up questions asked once symptom gathering is over.
///
/// Declaration order is the order in which they are asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailQuestion {
    Appetite,
    Gastric,
    Sleep,
}

impl DetailQuestion {
    pub const ALL: [DetailQuestion; 3] = [
        DetailQuestion::Appetite,
        DetailQuestion::Gastric,
        DetailQuestion::Sleep,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            DetailQuestion::Appetite => "appetite",
            DetailQuestion::Gastric => "gastric",
            DetailQuestion::Sleep => "sleep",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            DetailQuestion::Appetite => "How is your appetite lately? (Good/Average/Poor)",
            DetailQuestion::Gastric => {
                "Do you experience any acidity, gas, or stomach bloating? (Yes/No)"
            }
            DetailQuestion::Sleep => "How is your sleep quality? (Good/Disturbed/Insomnia)",
        }
    }
}

/// Everything carried between turns of one conversation.
///
/// The caller owns this value and hands it back verbatim on the next turn. Mutation
/// goes through methods so that collected symptoms stay unique and a recorded
/// diagnosis cannot be overwritten.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationContext {
    state: DialogueState,
    collected_symptoms: Vec<String>,
    history: BTreeMap<DetailQuestion, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnosis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<String>,
    final_report: bool,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh session that skips the greeting.
    pub fn restarted() -> Self {
        Self {
            state: DialogueState::GatheringSymptoms,
            ..Self::default()
        }
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    pub fn collected_symptoms(&self) -> &[String] {
        &self.collected_symptoms
    }

    pub fn has_symptom(&self, symptom: &str) -> bool {
        self.collected_symptoms.iter().any(|s| s == symptom)
    }

    pub fn history(&self) -> &BTreeMap<DetailQuestion, String> {
        &self.history
    }

    pub fn answer(&self, question: DetailQuestion) -> Option<&str> {
        self.history.get(&question).map(String::as_str)
    }

    pub fn diagnosis(&self) -> Option<&str> {
        self.diagnosis.as_deref()
    }

    pub fn confidence(&self) -> Option<&str> {
        self.confidence.as_deref()
    }

    pub fn final_report(&self) -> bool {
        self.final_report
    }

    /// Move between the gathering states.
    ///
    /// DIAGNOSIS is only entered through [`ConversationContext::complete_diagnosis`] and
    /// only left through a restart.
    pub fn set_state(&mut self, next: DialogueState) -> Result<()> {
        if next == DialogueState::Diagnosis {
            return Err(FlowError::InvariantViolation(
                "DIAGNOSIS can only be entered by recording a diagnosis".to_string(),
            ));
        }
        if self.state == DialogueState::Diagnosis {
            return Err(FlowError::InvariantViolation(format!(
                "cannot move from DIAGNOSIS to {next} without a restart"
            )));
        }
        self.state = next;
        Ok(())
    }

    /// Append symptoms in order, skipping ones already collected.
    /// Returns the symptoms that were actually added.
    pub fn merge_symptoms<I, S>(&mut self, symptoms: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = Vec::new();
        for symptom in symptoms {
            let symptom = symptom.into();
            if !self.has_symptom(&symptom) {
                self.collected_symptoms.push(symptom.clone());
                added.push(symptom);
            }
        }
        added
    }

    /// The first detail question without an answer, in asking order.
    pub fn next_unanswered(&self) -> Option<DetailQuestion> {
        DetailQuestion::ALL
            .into_iter()
            .find(|question| !self.history.contains_key(question))
    }

    pub fn record_answer(&mut self, question: DetailQuestion, answer: impl Into<String>) {
        self.history.insert(question, answer.into());
    }

    /// Store the diagnosis, enter DIAGNOSIS and raise the final report flag.
    pub fn complete_diagnosis(
        &mut self,
        diagnosis: impl Into<String>,
        confidence: impl Into<String>,
    ) -> Result<()> {
        if self.diagnosis.is_some() || self.final_report {
            return Err(FlowError::InvariantViolation(
                "diagnosis has already been recorded for this session".to_string(),
            ));
        }
        self.diagnosis = Some(diagnosis.into());
        self.confidence = Some(confidence.into());
        self.final_report = true;
        self.state = DialogueState::Diagnosis;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| FlowError::InvalidContext(e.to_string()))
    }

    /// Parse a context coming back from a caller.
    ///
    /// Unknown state names are rejected; duplicate symptoms are collapsed.
    pub fn from_json(raw: &str) -> Result<Self> {
        let context: ConversationContext =
            serde_json::from_str(raw).map_err(|e| FlowError::InvalidContext(e.to_string()))?;
        context.validated()
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let context: ConversationContext = serde_json::from_value(value)
            .map_err(|e| FlowError::InvalidContext(e.to_string()))?;
        context.validated()
    }

    fn validated(mut self) -> Result<Self> {
        let symptoms = std::mem::take(&mut self.collected_symptoms);
        self.merge_symptoms(symptoms);

        let diagnosed = self.state == DialogueState::Diagnosis;
        if diagnosed && self.diagnosis.is_none() {
            return Err(FlowError::InvalidContext(
                "state is DIAGNOSIS but no diagnosis is present".to_string(),
            ));
        }
        if !diagnosed && (self.diagnosis.is_some() || self.final_report) {
            return Err(FlowError::InvalidContext(format!(
                "diagnosis fields present while in state {}",
                self.state
            )));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_is_greeting() {
        let context = ConversationContext::default();
        assert_eq!(context.state(), DialogueState::Greeting);
        assert!(context.collected_symptoms().is_empty());
        assert!(!context.final_report());

        let parsed = ConversationContext::from_json("{}").unwrap();
        assert_eq!(parsed, context);
    }

    #[test]
    fn test_merge_skips_duplicates_and_keeps_order() {
        let mut context = ConversationContext::new();
        let added = context.merge_symptoms(["fever", "cough"]);
        assert_eq!(added, vec!["fever", "cough"]);

        let added = context.merge_symptoms(["cough", "headache", "fever", "headache"]);
        assert_eq!(added, vec!["headache"]);
        assert_eq!(context.collected_symptoms(), ["fever", "cough", "headache"]);
    }

    #[test]
    fn test_questions_are_answered_in_fixed_order() {
        let mut context = ConversationContext::new();
        assert_eq!(context.next_unanswered(), Some(DetailQuestion::Appetite));
        context.record_answer(DetailQuestion::Appetite, "Poor");
        assert_eq!(context.next_unanswered(), Some(DetailQuestion::Gastric));
        context.record_answer(DetailQuestion::Gastric, "yes");
        assert_eq!(context.next_unanswered(), Some(DetailQuestion::Sleep));
        context.record_answer(DetailQuestion::Sleep, "disturbed");
        assert_eq!(context.next_unanswered(), None);
    }

    #[test]
    fn test_diagnosis_is_recorded_once() {
        let mut context = ConversationContext::restarted();
        context.complete_diagnosis("Flu", "80.0%").unwrap();
        assert_eq!(context.state(), DialogueState::Diagnosis);
        assert!(context.final_report());

        let err = context.complete_diagnosis("Malaria", "90.0%").unwrap_err();
        assert!(matches!(err, FlowError::InvariantViolation(_)));
        assert_eq!(context.diagnosis(), Some("Flu"));
        assert!(context.set_state(DialogueState::GatheringSymptoms).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let mut context = ConversationContext::restarted();
        context.merge_symptoms(["fever", "cough", "fatigue"]);
        context.set_state(DialogueState::GatheringDetails).unwrap();
        context.record_answer(DetailQuestion::Appetite, "Average");

        let json = context.to_json().unwrap();
        assert!(json.contains("\"GATHERING_DETAILS\""));
        assert!(json.contains("\"appetite\":\"Average\""));
        assert_eq!(ConversationContext::from_json(&json).unwrap(), context);
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        let err = ConversationContext::from_json(r#"{"state":"SMALL_TALK"}"#).unwrap_err();
        assert!(matches!(err, FlowError::InvalidContext(_)));
    }

    #[test]
    fn test_inconsistent_diagnosis_fields_are_rejected() {
        let err = ConversationContext::from_json(r#"{"state":"DIAGNOSIS"}"#).unwrap_err();
        assert!(matches!(err, FlowError::InvalidContext(_)));

        let err = ConversationContext::from_json(
            r#"{"state":"GATHERING_SYMPTOMS","diagnosis":"Flu","final_report":true}"#,
        )
        .unwrap_err();
        assert!(matches!(err, FlowError::InvalidContext(_)));
    }

    #[test]
    fn test_duplicate_symptoms_are_collapsed_on_parse() {
        let context = ConversationContext::from_json(
            r#"{"state":"GATHERING_SYMPTOMS","collected_symptoms":["fever","fever","cough"]}"#,
        )
        .unwrap();
        assert_eq!(context.collected_symptoms(), ["fever", "cough"]);
    }
}
