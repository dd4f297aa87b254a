use serde_json::Value;
use std::sync::Arc;
use symptom_flow::{
    ConversationContext, DialogueGraph, FlowRunner, GraphBuilder, SessionStorage, Turn,
};
use tracing::{error, info, warn};

use crate::{
    config::{DialogueSettings, EngineConfig},
    correlation::CorrelationTable,
    dataset::{CaseRecord, read_cases},
    diagnosis::{Classifier, DiagnosisInvoker, SymptomAssessment},
    extractor::{KeywordExtractor, SymptomExtractor},
    precautions::PrecautionTable,
    profile::ProfileClassifier,
    report::DiagnosisReport,
    tasks::*,
    vocabulary::SymptomVocabulary,
};

pub const APOLOGY_MESSAGE: &str =
    "I'm sorry, something went wrong on my side. Please try again.";

/// Read-only tables shared by every conversation
#[derive(Clone)]
pub struct ClinicalKnowledge {
    pub vocabulary: Arc<SymptomVocabulary>,
    pub correlations: Arc<CorrelationTable>,
    pub precautions: Arc<PrecautionTable>,
}

impl ClinicalKnowledge {
    /// Vocabulary and correlations mined from the same case set
    pub fn from_cases(
        cases: &[CaseRecord],
        precautions: PrecautionTable,
        settings: &DialogueSettings,
    ) -> Self {
        let vocabulary = SymptomVocabulary::from_cases(cases);
        let correlations = CorrelationTable::build(cases, &vocabulary, settings.correlation_limit);
        Self {
            vocabulary: Arc::new(vocabulary),
            correlations: Arc::new(correlations),
            precautions: Arc::new(precautions),
        }
    }
}

/// Load every table named by the config. Missing or malformed files leave the
/// corresponding table empty and are logged; nothing here fails.
pub fn load_knowledge(
    config: &EngineConfig,
    settings: &DialogueSettings,
) -> (ClinicalKnowledge, Option<Arc<dyn Classifier>>) {
    let cases = match read_cases(&config.dataset_path) {
        Ok(cases) => {
            info!(path = %config.dataset_path.display(), cases = cases.len(), "Loaded case dataset");
            cases
        }
        Err(e) => {
            warn!(
                path = %config.dataset_path.display(),
                error = %e,
                "Case dataset unavailable, running without vocabulary, correlations or classifier"
            );
            Vec::new()
        }
    };

    let precautions = PrecautionTable::from_dataset(&config.precautions_path);
    let knowledge = ClinicalKnowledge::from_cases(&cases, precautions, settings);

    let classifier = ProfileClassifier::from_cases(&cases, knowledge.vocabulary.clone());
    let classifier: Option<Arc<dyn Classifier>> = if classifier.is_empty() {
        None
    } else {
        Some(Arc::new(classifier))
    };

    (knowledge, classifier)
}

pub fn build_symptom_workflow(
    knowledge: &ClinicalKnowledge,
    invoker: Arc<DiagnosisInvoker>,
    settings: Arc<DialogueSettings>,
) -> DialogueGraph {
    let extractor: Arc<dyn SymptomExtractor> =
        Arc::new(KeywordExtractor::new(knowledge.vocabulary.clone()));

    GraphBuilder::new("symptom_dialogue")
        .add_task(Arc::new(GreetingTask))
        .add_task(Arc::new(GatherSymptomsTask::new(
            extractor,
            knowledge.correlations.clone(),
            settings.clone(),
        )))
        .add_task(Arc::new(GatherDetailsTask::new(
            invoker,
            knowledge.precautions.clone(),
        )))
        .add_task(Arc::new(DiagnosisCompleteTask::new(settings)))
        .build()
}

/// Entry point for callers: `(text, context) -> (response, context)`.
///
/// Holds only read-only tables, so one engine serves any number of concurrent
/// conversations.
#[derive(Clone)]
pub struct SymptomEngine {
    graph: Arc<DialogueGraph>,
    knowledge: ClinicalKnowledge,
    invoker: Arc<DiagnosisInvoker>,
}

impl SymptomEngine {
    pub fn new(
        knowledge: ClinicalKnowledge,
        classifier: Option<Arc<dyn Classifier>>,
        settings: DialogueSettings,
    ) -> Self {
        let invoker = Arc::new(DiagnosisInvoker::new(knowledge.vocabulary.clone(), classifier));
        let graph = build_symptom_workflow(&knowledge, invoker.clone(), Arc::new(settings));
        Self {
            graph: Arc::new(graph),
            knowledge,
            invoker,
        }
    }

    pub fn knowledge(&self) -> &ClinicalKnowledge {
        &self.knowledge
    }

    /// Handle one turn. Internal errors become an apology and the caller's context
    /// is handed back unchanged.
    pub async fn respond(
        &self,
        text: &str,
        context: ConversationContext,
    ) -> (String, ConversationContext) {
        let state = context.state();
        match self.graph.execute_turn(&Turn::new(text), context.clone()).await {
            Ok(result) => (result.response, result.context),
            Err(e) => {
                error!(error = %e, state = %state, context = ?context, "Turn failed");
                (APOLOGY_MESSAGE.to_string(), context)
            }
        }
    }

    /// Like [`SymptomEngine::respond`] for callers that carry the context as JSON.
    /// A context that fails validation is replaced by a fresh one.
    pub async fn respond_value(&self, text: &str, context: Value) -> (String, Value) {
        let raw = context.to_string();
        let (response, context) = match ConversationContext::from_value(context) {
            Ok(context) => self.respond(text, context).await,
            Err(e) => {
                error!(error = %e, context = %raw, "Rejected conversation context, starting a new one");
                (APOLOGY_MESSAGE.to_string(), ConversationContext::new())
            }
        };
        let value = serde_json::to_value(&context).unwrap_or(Value::Null);
        (response, value)
    }

    /// Report for a conversation that has reached a diagnosis
    pub fn report(&self, context: &ConversationContext) -> Option<DiagnosisReport> {
        DiagnosisReport::from_context(context, &self.knowledge.precautions)
    }

    /// Direct prediction for a known symptom list, outside any conversation
    pub async fn assess(&self, symptoms: &[String]) -> SymptomAssessment {
        self.invoker.assess(symptoms).await
    }

    /// Runner for callers that keep conversations in a session store
    pub fn runner(&self, storage: Arc<dyn SessionStorage>) -> FlowRunner {
        FlowRunner::new(self.graph.clone(), storage)
    }
}
