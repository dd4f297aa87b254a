use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::vocabulary::SymptomVocabulary;

pub const UNKNOWN_DIAGNOSIS: &str = "Unknown";
pub const UNKNOWN_CONFIDENCE: &str = "0%";

/// A trained disease classifier, consumed as a black box.
///
/// Feature vectors are binary and indexed by [`SymptomVocabulary`] order.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn predict(&self, features: &[u8]) -> anyhow::Result<String>;

    async fn predict_probabilities(&self, features: &[u8]) -> anyhow::Result<Vec<(String, f64)>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub label: String,
    /// Top probability as a percentage with one decimal, e.g. `72.5%`
    pub confidence: String,
}

impl Diagnosis {
    pub fn unknown() -> Self {
        Self {
            label: UNKNOWN_DIAGNOSIS.to_string(),
            confidence: UNKNOWN_CONFIDENCE.to_string(),
        }
    }
}

/// One-shot prediction for an explicit symptom list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomAssessment {
    pub disease: String,
    /// Top probability as a percentage with two decimals
    pub confidence: String,
    /// Input symptoms the vocabulary knows, in vocabulary order
    pub matched_symptoms: Vec<String>,
}

/// Builds feature vectors from collected symptoms and asks the classifier
pub struct DiagnosisInvoker {
    vocabulary: Arc<SymptomVocabulary>,
    classifier: Option<Arc<dyn Classifier>>,
}

impl DiagnosisInvoker {
    pub fn new(vocabulary: Arc<SymptomVocabulary>, classifier: Option<Arc<dyn Classifier>>) -> Self {
        if classifier.is_none() {
            warn!("No classifier configured, diagnoses will be reported as Unknown");
        }
        Self {
            vocabulary,
            classifier,
        }
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// 1 at every vocabulary index whose symptom is present, 0 elsewhere
    pub fn feature_vector(&self, symptoms: &[String]) -> Vec<u8> {
        let present: HashSet<&str> = symptoms.iter().map(String::as_str).collect();
        self.vocabulary
            .iter()
            .map(|symptom| u8::from(present.contains(symptom)))
            .collect()
    }

    /// Diagnose the collected symptoms; never fails.
    pub async fn diagnose(&self, symptoms: &[String]) -> Diagnosis {
        match self.classify(symptoms).await {
            Some((label, probability)) => {
                let diagnosis = Diagnosis {
                    label,
                    confidence: format!("{:.1}%", probability * 100.0),
                };
                info!(
                    diagnosis = %diagnosis.label,
                    confidence = %diagnosis.confidence,
                    symptoms = symptoms.len(),
                    "Diagnosis produced"
                );
                diagnosis
            }
            None => Diagnosis::unknown(),
        }
    }

    pub async fn assess(&self, symptoms: &[String]) -> SymptomAssessment {
        let features = self.feature_vector(symptoms);
        let matched_symptoms: Vec<String> = self
            .vocabulary
            .iter()
            .zip(&features)
            .filter(|(_, present)| **present == 1)
            .map(|(symptom, _)| symptom.to_string())
            .collect();

        match self.classify(symptoms).await {
            Some((disease, probability)) => SymptomAssessment {
                disease,
                confidence: format!("{:.2}%", probability * 100.0),
                matched_symptoms,
            },
            None => SymptomAssessment {
                disease: UNKNOWN_DIAGNOSIS.to_string(),
                confidence: UNKNOWN_CONFIDENCE.to_string(),
                matched_symptoms: Vec::new(),
            },
        }
    }

    /// Label and top probability, or `None` when no usable answer is available
    async fn classify(&self, symptoms: &[String]) -> Option<(String, f64)> {
        let classifier = self.classifier.as_ref()?;
        let features = self.feature_vector(symptoms);

        let outcome = async {
            let label = classifier.predict(&features).await?;
            let distribution = classifier.predict_probabilities(&features).await?;
            let top = distribution
                .iter()
                .map(|(_, probability)| *probability)
                .fold(None, |best: Option<f64>, p| Some(best.map_or(p, |b| b.max(p))))
                .ok_or_else(|| anyhow::anyhow!("classifier returned an empty distribution"))?;
            anyhow::Ok((label, top))
        }
        .await;

        match outcome {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(error = %e, "Classifier failed, falling back to Unknown diagnosis");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Always answers with the same label and distribution
    pub(crate) struct FixedClassifier {
        pub label: String,
        pub distribution: Vec<(String, f64)>,
    }

    impl FixedClassifier {
        pub(crate) fn new(label: &str, probability: f64) -> Self {
            Self {
                label: label.to_string(),
                distribution: vec![
                    (label.to_string(), probability),
                    ("Other".to_string(), 1.0 - probability),
                ],
            }
        }
    }

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn predict(&self, _features: &[u8]) -> anyhow::Result<String> {
            Ok(self.label.clone())
        }

        async fn predict_probabilities(
            &self,
            _features: &[u8],
        ) -> anyhow::Result<Vec<(String, f64)>> {
            Ok(self.distribution.clone())
        }
    }

    struct BrokenClassifier;

    #[async_trait]
    impl Classifier for BrokenClassifier {
        async fn predict(&self, _features: &[u8]) -> anyhow::Result<String> {
            anyhow::bail!("model not loaded")
        }

        async fn predict_probabilities(
            &self,
            _features: &[u8],
        ) -> anyhow::Result<Vec<(String, f64)>> {
            anyhow::bail!("model not loaded")
        }
    }

    fn vocabulary() -> Arc<SymptomVocabulary> {
        Arc::new(SymptomVocabulary::new(["cough", "fatigue", "fever", "headache"]))
    }

    fn symptoms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_feature_vector_follows_vocabulary() {
        let invoker = DiagnosisInvoker::new(vocabulary(), None);
        let features = invoker.feature_vector(&symptoms(&["fever", "cough", "unknown"]));
        assert_eq!(features, vec![1, 0, 1, 0]);
    }

    #[tokio::test]
    async fn test_confidence_has_one_decimal() {
        let invoker = DiagnosisInvoker::new(
            vocabulary(),
            Some(Arc::new(FixedClassifier::new("Flu", 0.7253))),
        );
        let diagnosis = invoker.diagnose(&symptoms(&["fever"])).await;
        assert_eq!(diagnosis.label, "Flu");
        assert_eq!(diagnosis.confidence, "72.5%");
    }

    #[tokio::test]
    async fn test_missing_classifier_gives_sentinel() {
        let invoker = DiagnosisInvoker::new(vocabulary(), None);
        assert_eq!(invoker.diagnose(&symptoms(&["fever"])).await, Diagnosis::unknown());
    }

    #[tokio::test]
    async fn test_failing_classifier_gives_sentinel() {
        let invoker = DiagnosisInvoker::new(vocabulary(), Some(Arc::new(BrokenClassifier)));
        assert_eq!(invoker.diagnose(&symptoms(&["fever"])).await, Diagnosis::unknown());

        let empty = FixedClassifier {
            label: "Flu".to_string(),
            distribution: Vec::new(),
        };
        let invoker = DiagnosisInvoker::new(vocabulary(), Some(Arc::new(empty)));
        assert_eq!(invoker.diagnose(&symptoms(&["fever"])).await, Diagnosis::unknown());
    }

    #[tokio::test]
    async fn test_assessment_reports_matches_in_vocabulary_order() {
        let invoker = DiagnosisInvoker::new(
            vocabulary(),
            Some(Arc::new(FixedClassifier::new("Migraine", 0.5))),
        );
        let assessment = invoker
            .assess(&symptoms(&["headache", "fever", "dizziness"]))
            .await;
        assert_eq!(assessment.disease, "Migraine");
        assert_eq!(assessment.confidence, "50.00%");
        assert_eq!(assessment.matched_symptoms, vec!["fever", "headache"]);
    }
}
