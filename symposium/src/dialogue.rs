//! Top-level dialogue requests: moderation, then the pipeline.

use crate::config::SymposiumConfig;
use crate::errors::{ConfigError, DialogueError};
use crate::events::EventSink;
use crate::logging::{fields, truncate_topic, with_timing, ContextLogger};
use crate::moderation::{alternative_suggestions, ModerationGate, RejectionKind, Verdict};
use crate::pipeline::{ContextBag, Orchestrator, StageId};
use crate::service::GenerationService;
use chrono::Datelike;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// A completed dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dialogue {
    /// Run identifier, also present in every log line of the run.
    pub run_id: Uuid,
    /// The topic as submitted.
    pub topic: String,
    /// Year stamped on the run.
    pub current_year: i32,
    /// The four stage outputs.
    pub outputs: ContextBag,
}

impl Dialogue {
    /// Returns the output of `stage`.
    #[must_use]
    pub fn block(&self, stage: StageId) -> Option<&str> {
        self.outputs.get(stage)
    }

    /// Returns `(title, text)` pairs in stage order.
    pub fn sections(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.outputs.iter().map(|(stage, text)| (stage.title(), text))
    }
}

/// Returns the current calendar year in UTC.
#[must_use]
pub fn current_year() -> i32 {
    chrono::Utc::now().year()
}

/// Runs moderation and the pipeline for one topic.
#[derive(Debug)]
pub struct DialogueRunner {
    gate: ModerationGate,
    orchestrator: Orchestrator,
    logger: ContextLogger,
}

impl DialogueRunner {
    /// Creates a runner from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration does not validate.
    pub fn new(
        service: Arc<dyn GenerationService>,
        config: &SymposiumConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let logger = ContextLogger::new("symposium");
        Ok(Self {
            gate: ModerationGate::from_config(Arc::clone(&service), config)?
                .with_logger(logger.child("moderation")),
            orchestrator: Orchestrator::from_config(service, config)?
                .with_logger(logger.child("pipeline")),
            logger,
        })
    }

    /// Creates a runner from already-built parts.
    #[must_use]
    pub fn from_parts(gate: ModerationGate, orchestrator: Orchestrator) -> Self {
        Self {
            gate,
            orchestrator,
            logger: ContextLogger::new("symposium"),
        }
    }

    /// Sets the logger; the gate and orchestrator get child loggers.
    #[must_use]
    pub fn with_logger(self, logger: ContextLogger) -> Self {
        Self {
            gate: self.gate.with_logger(logger.child("moderation")),
            orchestrator: self.orchestrator.with_logger(logger.child("pipeline")),
            logger,
        }
    }

    /// Sets the progress event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.orchestrator = self.orchestrator.with_event_sink(events);
        self
    }

    /// Returns the moderation gate.
    #[must_use]
    pub const fn gate(&self) -> &ModerationGate {
        &self.gate
    }

    /// Runs a dialogue stamped with the current year.
    ///
    /// # Errors
    ///
    /// See [`run_for_year`](Self::run_for_year).
    pub async fn run(&self, topic: &str) -> Result<Dialogue, DialogueError> {
        self.run_for_year(topic, current_year()).await
    }

    /// Runs a dialogue stamped with `current_year`.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::Validation` for an over-long topic,
    /// `DialogueError::Rejected` when the classifier refuses it, and
    /// `DialogueError::Pipeline` when a stage fails.
    pub async fn run_for_year(
        &self,
        topic: &str,
        current_year: i32,
    ) -> Result<Dialogue, DialogueError> {
        let run_id = Uuid::new_v4();
        let logger = self.logger.with_context([
            ("run_id", json!(run_id.to_string())),
            ("topic", json!(truncate_topic(topic))),
        ]);

        match self.gate.evaluate(topic).await {
            Verdict::Approved => {}
            Verdict::Rejected { reason, kind } => {
                logger.info_with(
                    "Dialogue request turned away",
                    fields([("reason", reason.as_str())]),
                );
                let suggestions = alternative_suggestions();
                return Err(match kind {
                    RejectionKind::TooLong => DialogueError::Validation {
                        message: reason,
                        suggestions,
                    },
                    RejectionKind::Moderation => DialogueError::Rejected {
                        reason,
                        suggestions,
                    },
                });
            }
        }

        let outputs = with_timing(
            &logger,
            "dialogue",
            fields([("current_year", current_year)]),
            self.orchestrator.run_with_id(run_id, topic, current_year),
        )
        .await?;

        Ok(Dialogue {
            run_id,
            topic: topic.to_string(),
            current_year,
            outputs,
        })
    }
}
