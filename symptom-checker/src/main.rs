use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use symptom_checker::{DialogueSettings, EngineConfig, LogFormat, SymptomEngine, load_knowledge};
use symptom_flow::{ExecutionStatus, InMemorySessionStorage, Session, SessionStorage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const APOLOGY: &str = symptom_checker::workflow::APOLOGY_MESSAGE;

#[derive(Parser)]
#[command(name = "symptom-checker", about = "Conversational symptom checker")]
struct Cli {
    /// Case dataset CSV (overrides SYMPTOM_DATASET)
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Precautions CSV (overrides PRECAUTIONS_DATASET)
    #[arg(long)]
    precautions: Option<PathBuf>,

    /// Dialogue settings YAML (overrides DIALOGUE_CONFIG)
    #[arg(long)]
    dialogue_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Talk to the assistant on the terminal
    Chat,
    /// Predict a disease for a comma-separated list of symptom ids
    Predict {
        #[arg(long, value_delimiter = ',', required = true)]
        symptoms: Vec<String>,
    },
}

/// Initialize tracing based on environment variables. Logs go to stderr so they do
/// not interleave with the conversation.
fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "symptom_checker=info,symptom_flow=info".into());

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = EngineConfig::from_env();
    if let Some(path) = cli.dataset {
        config.dataset_path = path;
    }
    if let Some(path) = cli.precautions {
        config.precautions_path = path;
    }
    if let Some(path) = cli.dialogue_config {
        config.dialogue_config = Some(path);
    }

    init_tracing(config.log_format);

    let settings = DialogueSettings::load(config.dialogue_config.as_deref());
    let (knowledge, classifier) = load_knowledge(&config, &settings);
    info!(
        symptoms = knowledge.vocabulary.len(),
        diseases_with_precautions = knowledge.precautions.len(),
        "Knowledge loaded"
    );
    let engine = SymptomEngine::new(knowledge, classifier, settings);

    match cli.command {
        Command::Chat => chat(engine).await,
        Command::Predict { symptoms } => {
            let symptoms: Vec<String> = symptoms
                .iter()
                .map(|s| symptom_checker::dataset::normalize_symptom(s))
                .collect();
            let assessment = engine.assess(&symptoms).await;
            println!("{}", serde_json::to_string_pretty(&assessment)?);
            Ok(())
        }
    }
}

async fn chat(engine: SymptomEngine) -> anyhow::Result<()> {
    let storage = Arc::new(InMemorySessionStorage::new());
    let session_id = Uuid::new_v4().to_string();
    storage.save(Session::new(session_id.clone())).await?;
    let runner = engine.runner(storage.clone());

    info!(session_id = %session_id, "Chat session started");
    println!("Type 'quit' to leave.");

    // An empty first turn produces the welcome prompt.
    let mut pending = Some(String::new());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let text = match pending.take() {
            Some(text) => text,
            None => {
                print!("> ");
                std::io::stdout().flush()?;
                match lines.next_line().await? {
                    Some(line) => line,
                    None => break,
                }
            }
        };
        if matches!(text.trim(), "quit" | "exit") {
            break;
        }

        match runner.run(&session_id, &text).await {
            Ok(result) => {
                println!("{}", result.response);
                if result.status == ExecutionStatus::Completed && result.context.final_report() {
                    if let Some(report) = engine.report(&result.context) {
                        println!("\n{}\n", report.render());
                    }
                }
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Turn failed");
                println!("{APOLOGY}");
            }
        }
    }

    storage.delete(&session_id).await?;
    info!(session_id = %session_id, "Chat session ended");
    Ok(())
}
