use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Where the engine finds its data, read from the environment
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub dataset_path: PathBuf,
    pub precautions_path: PathBuf,
    pub dialogue_config: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let dataset_path =
            std::env::var("SYMPTOM_DATASET").unwrap_or_else(|_| "dataset.csv".to_string());
        let precautions_path =
            std::env::var("PRECAUTIONS_DATASET").unwrap_or_else(|_| "precautions.csv".to_string());
        let dialogue_config = std::env::var("DIALOGUE_CONFIG").ok().map(PathBuf::from);
        let log_format = std::env::var("LOG_FORMAT")
            .map(|raw| LogFormat::parse(&raw))
            .unwrap_or(LogFormat::Pretty);

        Self {
            dataset_path: PathBuf::from(dataset_path),
            precautions_path: PathBuf::from(precautions_path),
            dialogue_config,
            log_format,
        }
    }
}

/// Keyword sets the dialogue reacts to. All matching is substring-based on
/// lower-cased text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueKeywords {
    /// Moves to the detail questions even below the symptom threshold
    pub completion: String,
    /// Ends symptom gathering on a turn without new symptoms
    pub termination: Vec<String>,
    /// The user has more symptoms but did not name them
    pub continuation: Vec<String>,
    /// Starts a new session once a diagnosis exists
    pub restart: Vec<String>,
}

impl Default for DialogueKeywords {
    fn default() -> Self {
        Self {
            completion: "done".to_string(),
            termination: words(&["no", "done", "that's all", "nothing"]),
            continuation: words(&[
                "yes", "yeah", "i have", "there are", "more", "ok", "okay", "unnayi", "avunu",
            ]),
            restart: words(&["start", "hello", "again"]),
        }
    }
}

impl DialogueKeywords {
    fn normalized(self) -> Self {
        let clean = |list: Vec<String>| -> Vec<String> {
            list.into_iter()
                .map(|word| word.trim().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect()
        };
        let mut completion = self.completion.trim().to_lowercase();
        if completion.is_empty() {
            completion = DialogueKeywords::default().completion;
            warn!(completion = %completion, "Empty completion keyword, using default");
        }
        Self {
            completion,
            termination: clean(self.termination),
            continuation: clean(self.continuation),
            restart: clean(self.restart),
        }
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

/// Tunables for the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueSettings {
    /// Number of collected symptoms that ends symptom gathering
    pub symptom_threshold: usize,
    /// How many correlated symptoms to offer in one prompt
    pub suggestion_limit: usize,
    /// How many partners the correlation table keeps per symptom
    pub correlation_limit: usize,
    pub keywords: DialogueKeywords,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            symptom_threshold: 3,
            suggestion_limit: 3,
            correlation_limit: 5,
            keywords: DialogueKeywords::default(),
        }
    }
}

impl DialogueSettings {
    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        let settings: DialogueSettings = serde_yaml::from_str(raw)?;
        Ok(Self {
            keywords: settings.keywords.normalized(),
            ..settings
        })
    }

    /// Read settings from an optional YAML file. Problems with the file are
    /// logged and the defaults are used instead.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Dialogue config unreadable, using defaults");
                return Self::default();
            }
        };

        match Self::from_yaml_str(&raw) {
            Ok(settings) => {
                info!(path = %path.display(), "Loaded dialogue config");
                settings
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Dialogue config malformed, using defaults");
                Self::default()
            }
        }
    }
}
