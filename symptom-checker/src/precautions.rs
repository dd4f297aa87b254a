use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::dataset::{PrecautionRecord, read_precautions};

/// Advice given when a diagnosis has no precautions on record
pub const DEFAULT_PRECAUTION: &str = "Please consult a doctor for advice.";

const SEPARATOR: &str = ", ";

/// Advisory text per diagnosis label. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct PrecautionTable {
    advice: HashMap<String, String>,
}

impl PrecautionTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn build(records: &[PrecautionRecord]) -> Self {
        let advice = records
            .iter()
            .map(|record| {
                let joined = record
                    .precautions
                    .iter()
                    .map(|p| p.trim())
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
                    .join(SEPARATOR);
                (record.disease.trim().to_string(), joined)
            })
            .collect();
        Self { advice }
    }

    /// Load from a precautions CSV; an unreadable file yields an empty table.
    pub fn from_dataset(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match read_precautions(path) {
            Ok(records) => {
                let table = Self::build(&records);
                info!(path = %path.display(), diseases = table.len(), "Loaded precautions");
                table
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Precautions unavailable, every diagnosis gets the default advice"
                );
                Self::empty()
            }
        }
    }

    pub fn lookup(&self, diagnosis: &str) -> &str {
        self.advice
            .get(diagnosis.trim())
            .map(String::as_str)
            .unwrap_or(DEFAULT_PRECAUTION)
    }

    pub fn len(&self) -> usize {
        self.advice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advice.is_empty()
    }
}
