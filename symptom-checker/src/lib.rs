pub mod config;
pub mod correlation;
pub mod dataset;
pub mod diagnosis;
pub mod extractor;
pub mod precautions;
pub mod profile;
pub mod report;
pub mod tasks;
pub mod vocabulary;
pub mod workflow;

pub use config::{DialogueKeywords, DialogueSettings, EngineConfig, LogFormat};
pub use diagnosis::{Classifier, Diagnosis, DiagnosisInvoker, SymptomAssessment};
pub use report::DiagnosisReport;
pub use workflow::{ClinicalKnowledge, SymptomEngine, build_symptom_workflow, load_knowledge};
