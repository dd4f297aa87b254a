//! CSV readers for the historical case dataset and the precaution table.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

const DISEASE_COLUMN: &str = "Disease";
const SYMPTOM_MARKER: &str = "Symptom";
const PRECAUTION_COLUMNS: [&str; 4] = [
    "Precaution_1",
    "Precaution_2",
    "Precaution_3",
    "Precaution_4",
];

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to open dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset has no '{0}' column")]
    MissingColumn(String),
}

/// One historical case: a diagnosis and the symptoms recorded with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub diagnosis: String,
    pub symptoms: Vec<String>,
}

/// Advice for one disease, one entry per non-empty precaution column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecautionRecord {
    pub disease: String,
    pub precautions: Vec<String>,
}

/// Canonical form of a symptom token
pub fn normalize_symptom(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn cell(record: &csv::StringRecord, idx: usize) -> Option<&str> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != "nan")
}

fn csv_reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(source)
}

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize, DatasetError> {
    headers
        .iter()
        .position(|header| header.trim() == name)
        .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
}

pub fn read_cases(path: impl AsRef<Path>) -> Result<Vec<CaseRecord>, DatasetError> {
    parse_cases(File::open(path)?)
}

/// Parse cases from CSV with a `Disease` column and any number of columns whose
/// header contains `Symptom`.
pub fn parse_cases<R: Read>(source: R) -> Result<Vec<CaseRecord>, DatasetError> {
    let mut reader = csv_reader(source);
    let headers = reader.headers()?.clone();
    let disease_idx = column(&headers, DISEASE_COLUMN)?;
    let symptom_idxs: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, header)| header.contains(SYMPTOM_MARKER))
        .map(|(idx, _)| idx)
        .collect();

    let mut cases = Vec::new();
    for record in reader.records() {
        let record = record?;
        let symptoms = symptom_idxs
            .iter()
            .filter_map(|&idx| cell(&record, idx))
            .map(normalize_symptom)
            .collect();
        cases.push(CaseRecord {
            diagnosis: cell(&record, disease_idx).unwrap_or_default().to_string(),
            symptoms,
        });
    }
    Ok(cases)
}

pub fn read_precautions(path: impl AsRef<Path>) -> Result<Vec<PrecautionRecord>, DatasetError> {
    parse_precautions(File::open(path)?)
}

/// Parse `Disease, Precaution_1..Precaution_4` rows. Rows without a disease are skipped.
pub fn parse_precautions<R: Read>(source: R) -> Result<Vec<PrecautionRecord>, DatasetError> {
    let mut reader = csv_reader(source);
    let headers = reader.headers()?.clone();
    let disease_idx = column(&headers, DISEASE_COLUMN)?;
    let precaution_idxs: Vec<usize> = PRECAUTION_COLUMNS
        .iter()
        .filter_map(|name| column(&headers, name).ok())
        .collect();

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(disease) = cell(&record, disease_idx) else {
            continue;
        };
        records.push(PrecautionRecord {
            disease: disease.to_string(),
            precautions: precaution_idxs
                .iter()
                .filter_map(|&idx| cell(&record, idx))
                .map(str::to_string)
                .collect(),
        });
    }
    Ok(records)
}
