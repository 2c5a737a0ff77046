//! Symposium CLI Binary
//!
//! Generates a moderated philosophical dialogue for one topic and prints the
//! four sections to stdout. Logs go to stderr.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use symposium::config::SymposiumConfig;
use symposium::dialogue::{current_year, DialogueRunner};
use symposium::errors::DialogueError;
use symposium::events::LoggingEventSink;
use symposium::logging::{init_logging, LogFormat};
use symposium::moderation::{rejection_guidelines, themed_suggestions};
use symposium::service::AnthropicService;
use tracing::{error, info};

/// Symposium - moderated multi-stage philosophical dialogues
#[derive(Debug, Parser)]
#[command(name = "symposium", version)]
#[command(about = "Generate a Socratic dialogue on a topic")]
struct Cli {
    /// Topic to examine; leave empty to let the model choose
    #[arg(long, default_value = "")]
    topic: String,

    /// Year stamped on the dialogue (default: current year)
    #[arg(long)]
    year: Option<i32>,

    /// JSON configuration file
    #[arg(long, env = "SYMPOSIUM_CONFIG")]
    config: Option<PathBuf>,

    /// Log format (text, json)
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Log level or filter directive (debug, info, warn, error, ...)
    #[arg(long)]
    log_level: Option<String>,

    /// Generation model override
    #[arg(long)]
    model: Option<String>,
}

/// Build configuration from defaults, file, environment and flags.
/// Precedence: flags override environment override file override defaults.
fn build_config(cli: &Cli) -> anyhow::Result<SymposiumConfig> {
    let mut config = SymposiumConfig::load(cli.config.as_deref()).with_context(|| {
        cli.config.as_ref().map_or_else(
            || "failed to load configuration".to_string(),
            |path| format!("failed to load config from {}", path.display()),
        )
    })?;

    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

fn report_failure(topic: &str, err: &DialogueError) {
    eprintln!("{}", err.user_message());

    let suggestions = match err {
        DialogueError::Rejected { .. } => themed_suggestions(topic),
        DialogueError::Validation { .. } | DialogueError::Pipeline(_) => err.suggestions().to_vec(),
    };
    if !suggestions.is_empty() {
        eprintln!("\nTry one of these instead:");
        for suggestion in suggestions {
            eprintln!("  - {suggestion}");
        }
    }
    if matches!(err, DialogueError::Rejected { .. }) {
        eprintln!("\n{}", rejection_guidelines());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    // Initialize logging early
    init_logging(&config.logging)?;
    info!("Symposium CLI starting");

    let mut service = AnthropicService::from_env()?;
    if let Some(ref model) = cli.model {
        service = service.with_generation_model(model.clone());
    }

    let runner = DialogueRunner::new(Arc::new(service), &config)?
        .with_event_sink(Arc::new(LoggingEventSink::debug()));
    let year = cli.year.unwrap_or_else(current_year);

    match runner.run_for_year(&cli.topic, year).await {
        Ok(dialogue) => {
            info!(run_id = %dialogue.run_id, "Dialogue completed");
            for (title, text) in dialogue.sections() {
                println!("## {title}\n\n{text}\n");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(kind = err.kind(), error = %err, "Dialogue failed");
            report_failure(&cli.topic, &err);
            Ok(ExitCode::FAILURE)
        }
    }
}
