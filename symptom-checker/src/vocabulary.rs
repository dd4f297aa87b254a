use std::collections::{BTreeSet, HashMap};

use crate::dataset::{CaseRecord, normalize_symptom};

/// Human-readable form of a symptom id: `skin_rash` becomes `skin rash`
pub fn humanize(symptom: &str) -> String {
    symptom.replace('_', " ")
}

/// The ordered list of known symptoms.
///
/// A symptom's position is its index in the classifier's feature vector, so the
/// vocabulary is immutable once built.
#[derive(Debug, Clone, Default)]
pub struct SymptomVocabulary {
    symptoms: Vec<String>,
    index: HashMap<String, usize>,
}

impl SymptomVocabulary {
    /// Build from ids in feature order. Ids are trimmed and lower-cased; blanks and
    /// repeats are dropped.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocabulary = Self::default();
        for id in ids {
            let id = normalize_symptom(id.as_ref());
            if humanize(&id).trim().is_empty() || vocabulary.index.contains_key(&id) {
                continue;
            }
            vocabulary.index.insert(id.clone(), vocabulary.symptoms.len());
            vocabulary.symptoms.push(id);
        }
        vocabulary
    }

    /// Sorted unique symptoms of a case dataset, the ordering used when the
    /// classifier is trained on the same data.
    pub fn from_cases(cases: &[CaseRecord]) -> Self {
        let unique: BTreeSet<&str> = cases
            .iter()
            .flat_map(|case| case.symptoms.iter().map(String::as_str))
            .collect();
        Self::new(unique)
    }

    pub fn len(&self) -> usize {
        self.symptoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
    }

    pub fn contains(&self, symptom: &str) -> bool {
        self.index.contains_key(symptom)
    }

    pub fn index_of(&self, symptom: &str) -> Option<usize> {
        self.index.get(symptom).copied()
    }

    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symptoms.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_preserved_and_repeats_dropped() {
        let vocabulary = SymptomVocabulary::new(["Fever", "cough", " fever ", "", "skin_rash"]);
        assert_eq!(vocabulary.symptoms(), ["fever", "cough", "skin_rash"]);
        assert_eq!(vocabulary.index_of("skin_rash"), Some(2));
        assert!(vocabulary.contains("cough"));
        assert!(!vocabulary.contains("Fever"));
    }

    #[test]
    fn test_from_cases_is_sorted() {
        let cases = vec![
            CaseRecord {
                diagnosis: "Flu".to_string(),
                symptoms: vec!["fever".to_string(), "cough".to_string()],
            },
            CaseRecord {
                diagnosis: "Migraine".to_string(),
                symptoms: vec!["headache".to_string(), "fever".to_string()],
            },
        ];
        let vocabulary = SymptomVocabulary::from_cases(&cases);
        assert_eq!(vocabulary.symptoms(), ["cough", "fever", "headache"]);
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("skin_rash"), "skin rash");
        assert_eq!(humanize("fever"), "fever");
    }
}
