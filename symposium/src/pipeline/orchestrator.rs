//! Sequential stage orchestration.

use super::bag::ContextBag;
use super::stage::{StageId, StageRequest, StageTemplates};
use crate::config::SymposiumConfig;
use crate::errors::{ConfigError, PipelineError, ServiceError, StageFailure};
use crate::events::{EventSink, NoOpEventSink, ProgressEvent};
use crate::logging::{truncate_topic, with_timing, ContextLogger, Fields};
use crate::service::GenerationService;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default per-stage call timeout.
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs the four stages in order, threading outputs between them.
///
/// Each stage makes exactly one `generate` call. The first failure aborts
/// the run; outputs of earlier stages are dropped with the bag.
pub struct Orchestrator {
    service: Arc<dyn GenerationService>,
    templates: StageTemplates,
    stage_timeout: Duration,
    logger: ContextLogger,
    events: Arc<dyn EventSink>,
}

impl Orchestrator {
    /// Creates an orchestrator.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidTemplate` if a template reads a stage
    /// that has not run yet.
    pub fn new(
        service: Arc<dyn GenerationService>,
        templates: StageTemplates,
    ) -> Result<Self, ConfigError> {
        templates.validate()?;
        Ok(Self {
            service,
            templates,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
            logger: ContextLogger::new("symposium.pipeline"),
            events: Arc::new(NoOpEventSink),
        })
    }

    /// Creates an orchestrator from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the templates or timeout are invalid.
    pub fn from_config(
        service: Arc<dyn GenerationService>,
        config: &SymposiumConfig,
    ) -> Result<Self, ConfigError> {
        if config.stage_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "stage_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(Self::new(service, config.templates.clone())?.with_stage_timeout(config.stage_timeout()))
    }

    /// Sets the per-stage call timeout.
    #[must_use]
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Sets the logger.
    #[must_use]
    pub fn with_logger(mut self, logger: ContextLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Sets the progress event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the stage templates.
    #[must_use]
    pub fn templates(&self) -> &StageTemplates {
        &self.templates
    }

    /// Returns the per-stage call timeout.
    #[must_use]
    pub const fn stage_timeout(&self) -> Duration {
        self.stage_timeout
    }

    /// Runs all stages under a fresh run id.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` naming the first stage that failed.
    pub async fn run(&self, topic: &str, current_year: i32) -> Result<ContextBag, PipelineError> {
        self.run_with_id(Uuid::new_v4(), topic, current_year).await
    }

    /// Runs all stages under `run_id`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` naming the first stage that failed.
    pub async fn run_with_id(
        &self,
        run_id: Uuid,
        topic: &str,
        current_year: i32,
    ) -> Result<ContextBag, PipelineError> {
        let logger = self.logger.with_context([
            ("run_id", json!(run_id.to_string())),
            ("topic", json!(truncate_topic(topic))),
        ]);
        let started = Instant::now();

        let bag = with_timing(
            &logger,
            "dialogue_pipeline",
            Fields::new(),
            self.run_stages(&logger, run_id, topic, current_year),
        )
        .await?;

        self.events
            .emit(&ProgressEvent::PipelineCompleted {
                run_id,
                elapsed_seconds: started.elapsed().as_secs_f64(),
            })
            .await;
        Ok(bag)
    }

    async fn run_stages(
        &self,
        logger: &ContextLogger,
        run_id: Uuid,
        topic: &str,
        current_year: i32,
    ) -> Result<ContextBag, PipelineError> {
        let mut bag = ContextBag::new();

        for stage in StageId::ALL {
            let stage_logger = logger.with_context([("stage", stage.as_str())]);
            let request = StageRequest::build(&self.templates, stage, topic, current_year, &bag);

            self.events
                .emit(&ProgressEvent::StageStarted { run_id, stage })
                .await;
            let started = Instant::now();

            let outcome = with_timing(
                &stage_logger,
                &stage.operation_name(),
                Fields::new(),
                self.generate(&request),
            )
            .await
            .and_then(|output| {
                bag.record(stage, output.clone())?;
                Ok(output)
            });
            let elapsed_seconds = started.elapsed().as_secs_f64();

            match outcome {
                Ok(output) => {
                    self.events
                        .emit(&ProgressEvent::StageCompleted {
                            run_id,
                            stage,
                            output,
                            elapsed_seconds,
                        })
                        .await;
                }
                Err(cause) => {
                    self.events
                        .emit(&ProgressEvent::StageFailed {
                            run_id,
                            stage,
                            error: cause.to_string(),
                            elapsed_seconds,
                        })
                        .await;
                    return Err(PipelineError::new(stage, cause));
                }
            }
        }

        Ok(bag)
    }

    async fn generate(&self, request: &StageRequest) -> Result<String, StageFailure> {
        let output = tokio::time::timeout(self.stage_timeout, self.service.generate(request))
            .await
            .map_err(|_| ServiceError::Timeout(self.stage_timeout))??;

        if output.trim().is_empty() {
            return Err(StageFailure::EmptyOutput);
        }
        Ok(output)
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("templates", &self.templates)
            .field("stage_timeout", &self.stage_timeout)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}
