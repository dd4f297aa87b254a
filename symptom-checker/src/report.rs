use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use symptom_flow::{ConversationContext, DetailQuestion, DialogueState};
use uuid::Uuid;

use crate::{precautions::PrecautionTable, vocabulary::humanize};

/// The record a caller saves once a conversation raises its final report flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub symptoms: Vec<String>,
    pub disease: String,
    pub confidence: String,
    pub history: BTreeMap<String, String>,
    pub precautions: String,
}

impl DiagnosisReport {
    /// `None` unless the conversation has reached a diagnosis
    pub fn from_context(context: &ConversationContext, precautions: &PrecautionTable) -> Option<Self> {
        if context.state() != DialogueState::Diagnosis {
            return None;
        }
        let disease = context.diagnosis()?.to_string();

        Some(Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            symptoms: context.collected_symptoms().to_vec(),
            confidence: context.confidence().unwrap_or_default().to_string(),
            history: context
                .history()
                .iter()
                .map(|(question, answer)| (question.key().to_string(), answer.clone()))
                .collect(),
            precautions: precautions.lookup(&disease).to_string(),
            disease,
        })
    }

    /// Plain-text rendering for terminals and logs
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Medical report {}", self.id);
        let _ = writeln!(out, "Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M UTC"));
        let symptoms: Vec<String> = self.symptoms.iter().map(|s| humanize(s)).collect();
        let _ = writeln!(out, "Symptoms: {}", symptoms.join(", "));
        for question in DetailQuestion::ALL {
            if let Some(answer) = self.history.get(question.key()) {
                let _ = writeln!(out, "{}: {}", question.key(), answer.trim());
            }
        }
        let _ = writeln!(out, "Suspected condition: {} ({})", self.disease, self.confidence);
        let _ = write!(out, "Precautions: {}", self.precautions);
        out
    }
}
