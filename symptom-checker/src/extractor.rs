use std::sync::Arc;

use crate::vocabulary::{SymptomVocabulary, humanize};

/// Turns free text into the symptoms it mentions
pub trait SymptomExtractor: Send + Sync {
    /// Matched symptom ids, without duplicates. `text` is already lower-cased.
    fn extract(&self, text: &str) -> Vec<String>;
}

/// Substring and keyword matcher over the vocabulary.
///
/// A symptom matches when its phrase (`skin rash`) or raw id (`skin_rash`) occurs in
/// the text, or when every word of a multi-word phrase occurs anywhere in it. The
/// last rule is loose on purpose and does produce false positives on long input.
pub struct KeywordExtractor {
    vocabulary: Arc<SymptomVocabulary>,
    phrases: Vec<String>,
}

impl KeywordExtractor {
    pub fn new(vocabulary: Arc<SymptomVocabulary>) -> Self {
        let phrases = vocabulary.iter().map(humanize).collect();
        Self {
            vocabulary,
            phrases,
        }
    }

    /// Earliest position at which `id` matched, if it matched at all
    fn match_position(text: &str, id: &str, phrase: &str) -> Option<usize> {
        if let Some(pos) = text.find(phrase) {
            return Some(pos);
        }
        if let Some(pos) = text.find(id) {
            return Some(pos);
        }

        let parts: Vec<&str> = phrase.split_whitespace().collect();
        if parts.len() < 2 {
            return None;
        }
        parts
            .iter()
            .map(|part| text.find(part))
            .collect::<Option<Vec<usize>>>()
            .and_then(|positions| positions.into_iter().min())
    }
}

impl SymptomExtractor for KeywordExtractor {
    /// Ordered by where each symptom first shows up in the text, then by vocabulary order.
    fn extract(&self, text: &str) -> Vec<String> {
        let mut matches: Vec<(usize, usize)> = self
            .vocabulary
            .iter()
            .zip(&self.phrases)
            .enumerate()
            .filter_map(|(idx, (id, phrase))| {
                Self::match_position(text, id, phrase).map(|pos| (pos, idx))
            })
            .collect();
        matches.sort_unstable();

        matches
            .into_iter()
            .map(|(_, idx)| self.vocabulary.symptoms()[idx].clone())
            .collect()
    }
}
