// Dialogue state tasks, one per DialogueState
pub mod diagnosis_complete;
pub mod gather_details;
pub mod gather_symptoms;
pub mod greeting;

// Shared helpers
pub mod utils;

pub use diagnosis_complete::DiagnosisCompleteTask;
pub use gather_details::GatherDetailsTask;
pub use gather_symptoms::GatherSymptomsTask;
pub use greeting::GreetingTask;
