//! Symptom co-occurrence table mined from historical cases.

use std::collections::HashMap;
use tracing::info;

use crate::{dataset::CaseRecord, vocabulary::SymptomVocabulary};

/// Partner counts for one symptom, kept in first-encountered order so that a stable
/// sort breaks ties the same way every time.
#[derive(Default)]
struct PartnerCounts {
    counts: Vec<(String, usize)>,
    position: HashMap<String, usize>,
}

impl PartnerCounts {
    fn increment(&mut self, partner: &str) {
        match self.position.get(partner) {
            Some(&idx) => self.counts[idx].1 += 1,
            None => {
                self.position.insert(partner.to_string(), self.counts.len());
                self.counts.push((partner.to_string(), 1));
            }
        }
    }

    fn top(mut self, limit: usize) -> Vec<String> {
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts
            .into_iter()
            .take(limit)
            .map(|(partner, _)| partner)
            .collect()
    }
}

/// For each symptom, the symptoms it most often appears with, most frequent first.
/// Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct CorrelationTable {
    related: HashMap<String, Vec<String>>,
}

impl CorrelationTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Count pairwise co-occurrences in every case and keep the top `limit` partners.
    /// Cells outside the vocabulary are ignored.
    pub fn build(cases: &[CaseRecord], vocabulary: &SymptomVocabulary, limit: usize) -> Self {
        let mut co_occurrence: HashMap<&str, PartnerCounts> = HashMap::new();

        for case in cases {
            let present: Vec<&str> = case
                .symptoms
                .iter()
                .map(String::as_str)
                .filter(|symptom| vocabulary.contains(symptom))
                .collect();

            for &first in &present {
                for &second in &present {
                    if first != second {
                        co_occurrence.entry(first).or_default().increment(second);
                    }
                }
            }
        }

        let related: HashMap<String, Vec<String>> = co_occurrence
            .into_iter()
            .map(|(symptom, counts)| (symptom.to_string(), counts.top(limit)))
            .collect();

        info!(
            cases = cases.len(),
            symptoms = related.len(),
            "Built symptom correlation table"
        );
        Self { related }
    }

    /// Most frequent partners of `symptom`; empty when unknown
    pub fn related(&self, symptom: &str) -> &[String] {
        self.related.get(symptom).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Partners of `symptom` that `exclude` does not reject, at most `max` of them
    pub fn suggestions<F>(&self, symptom: &str, max: usize, exclude: F) -> Vec<&str>
    where
        F: Fn(&str) -> bool,
    {
        self.related(symptom)
            .iter()
            .map(String::as_str)
            .filter(|partner| !exclude(partner))
            .take(max)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.related.is_empty()
    }
}
