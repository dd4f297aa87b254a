//! Reference classifier that scores diseases by symptom overlap with the cases on record.
//! Used when no trained model is plugged in.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::info;

use crate::{dataset::CaseRecord, diagnosis::Classifier, vocabulary::SymptomVocabulary};

struct DiseaseProfile {
    label: String,
    symptoms: BTreeSet<usize>,
}

pub struct ProfileClassifier {
    vocabulary_len: usize,
    profiles: Vec<DiseaseProfile>,
}

impl ProfileClassifier {
    /// One profile per disease: the union of symptoms across its cases.
    /// Profiles keep the order in which diseases first appear.
    pub fn from_cases(cases: &[CaseRecord], vocabulary: Arc<SymptomVocabulary>) -> Self {
        let mut profiles: Vec<DiseaseProfile> = Vec::new();
        let mut by_label: HashMap<&str, usize> = HashMap::new();

        for case in cases.iter().filter(|case| !case.diagnosis.is_empty()) {
            let idx = *by_label.entry(case.diagnosis.as_str()).or_insert_with(|| {
                profiles.push(DiseaseProfile {
                    label: case.diagnosis.clone(),
                    symptoms: BTreeSet::new(),
                });
                profiles.len() - 1
            });
            profiles[idx]
                .symptoms
                .extend(case.symptoms.iter().filter_map(|s| vocabulary.index_of(s)));
        }

        info!(diseases = profiles.len(), "Built disease profiles");
        Self {
            vocabulary_len: vocabulary.len(),
            profiles,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Jaccard similarity of the present features with every profile, normalized
    /// to sum to one.
    fn distribution(&self, features: &[u8]) -> anyhow::Result<Vec<(String, f64)>> {
        if features.len() != self.vocabulary_len {
            anyhow::bail!(
                "feature vector has {} entries, vocabulary has {}",
                features.len(),
                self.vocabulary_len
            );
        }
        if self.profiles.is_empty() {
            anyhow::bail!("no disease profiles available");
        }

        let present: BTreeSet<usize> = features
            .iter()
            .enumerate()
            .filter(|(_, value)| **value != 0)
            .map(|(idx, _)| idx)
            .collect();

        let scores: Vec<f64> = self
            .profiles
            .iter()
            .map(|profile| {
                let union = profile.symptoms.union(&present).count();
                if union == 0 {
                    return 0.0;
                }
                profile.symptoms.intersection(&present).count() as f64 / union as f64
            })
            .collect();

        let total: f64 = scores.iter().sum();
        let uniform = 1.0 / self.profiles.len() as f64;
        Ok(self
            .profiles
            .iter()
            .zip(scores)
            .map(|(profile, score)| {
                let probability = if total > 0.0 { score / total } else { uniform };
                (profile.label.clone(), probability)
            })
            .collect())
    }
}

#[async_trait]
impl Classifier for ProfileClassifier {
    async fn predict(&self, features: &[u8]) -> anyhow::Result<String> {
        let distribution = self.distribution(features)?;
        let mut best: Option<&(String, f64)> = None;
        for entry in &distribution {
            if best.is_none_or(|current| entry.1 > current.1) {
                best = Some(entry);
            }
        }
        best.map(|(label, _)| label.clone())
            .ok_or_else(|| anyhow::anyhow!("no disease profiles available"))
    }

    async fn predict_probabilities(&self, features: &[u8]) -> anyhow::Result<Vec<(String, f64)>> {
        self.distribution(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(diagnosis: &str, symptoms: &[&str]) -> CaseRecord {
        CaseRecord {
            diagnosis: diagnosis.to_string(),
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn fixture() -> (ProfileClassifier, Arc<SymptomVocabulary>) {
        let cases = vec![
            case("Flu", &["fever", "cough", "fatigue"]),
            case("Flu", &["cough", "fever", "headache"]),
            case("Migraine", &["headache", "nausea", "dizziness"]),
        ];
        let vocabulary = Arc::new(SymptomVocabulary::from_cases(&cases));
        (ProfileClassifier::from_cases(&cases, vocabulary.clone()), vocabulary)
    }

    fn features(vocabulary: &SymptomVocabulary, present: &[&str]) -> Vec<u8> {
        vocabulary
            .iter()
            .map(|s| u8::from(present.contains(&s)))
            .collect()
    }

    #[tokio::test]
    async fn test_best_overlap_wins() {
        let (classifier, vocabulary) = fixture();
        let input = features(&vocabulary, &["nausea", "dizziness"]);
        assert_eq!(classifier.predict(&input).await.unwrap(), "Migraine");

        let input = features(&vocabulary, &["fever", "cough"]);
        assert_eq!(classifier.predict(&input).await.unwrap(), "Flu");
    }

    #[tokio::test]
    async fn test_distribution_sums_to_one() {
        let (classifier, vocabulary) = fixture();
        let input = features(&vocabulary, &["headache"]);
        let distribution = classifier.predict_probabilities(&input).await.unwrap();
        let total: f64 = distribution.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);

        let empty = features(&vocabulary, &[]);
        let distribution = classifier.predict_probabilities(&empty).await.unwrap();
        assert!(distribution.iter().all(|(_, p)| (*p - 0.5).abs() < 1e-9));
    }

    #[tokio::test]
    async fn test_wrong_vector_length_is_an_error() {
        let (classifier, _) = fixture();
        assert!(classifier.predict(&[1, 0]).await.is_err());
    }
}
