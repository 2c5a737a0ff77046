//! Scripted doubles for the generation service and the clock.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::errors::ServiceError;
use crate::pipeline::{StageId, StageRequest};
use crate::ratelimit::Clock;
use crate::service::GenerationService;

/// A generation service that answers from a script and records every call.
///
/// By default it approves every topic and answers each stage with
/// `"{stage} output"`.
#[derive(Debug)]
pub struct ScriptedService {
    classify_reply: Mutex<Result<String, ServiceError>>,
    outputs: Mutex<HashMap<StageId, Result<String, ServiceError>>>,
    delay: Mutex<Option<Duration>>,
    classified: Mutex<Vec<String>>,
    requests: Mutex<Vec<StageRequest>>,
}

impl Default for ScriptedService {
    fn default() -> Self {
        Self {
            classify_reply: Mutex::new(Ok("APPROPRIATE".to_string())),
            outputs: Mutex::new(HashMap::new()),
            delay: Mutex::new(None),
            classified: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedService {
    /// Creates a service that approves everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the raw classifier reply.
    #[must_use]
    pub fn with_classification(self, reply: impl Into<String>) -> Self {
        *self.classify_reply.lock() = Ok(reply.into());
        self
    }

    /// Makes every classification call fail.
    #[must_use]
    pub fn with_classification_error(self, error: ServiceError) -> Self {
        *self.classify_reply.lock() = Err(error);
        self
    }

    /// Sets the output for one stage.
    #[must_use]
    pub fn with_output(self, stage: StageId, output: impl Into<String>) -> Self {
        self.outputs.lock().insert(stage, Ok(output.into()));
        self
    }

    /// Makes one stage fail.
    #[must_use]
    pub fn with_stage_error(self, stage: StageId, error: ServiceError) -> Self {
        self.outputs.lock().insert(stage, Err(error));
        self
    }

    /// Delays every call by `delay`.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = Some(delay);
        self
    }

    /// Returns the number of classification calls.
    #[must_use]
    pub fn classify_calls(&self) -> usize {
        self.classified.lock().len()
    }

    /// Returns the number of generation calls.
    #[must_use]
    pub fn generate_calls(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns the number of calls of either kind.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.classify_calls() + self.generate_calls()
    }

    /// Returns the topics passed to `classify`.
    #[must_use]
    pub fn classified_topics(&self) -> Vec<String> {
        self.classified.lock().clone()
    }

    /// Returns every generation request, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<StageRequest> {
        self.requests.lock().clone()
    }

    async fn pause(&self) {
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl GenerationService for ScriptedService {
    async fn classify(&self, topic: &str) -> Result<String, ServiceError> {
        self.classified.lock().push(topic.to_string());
        self.pause().await;
        self.classify_reply.lock().clone()
    }

    async fn generate(&self, request: &StageRequest) -> Result<String, ServiceError> {
        self.requests.lock().push(request.clone());
        self.pause().await;
        self.outputs
            .lock()
            .get(&request.stage)
            .cloned()
            .unwrap_or_else(|| Ok(format!("{} output", request.stage)))
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }

    /// Advances the clock by `duration` instead of waiting.
    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ContextBag, StageTemplates};

    fn request(stage: StageId) -> StageRequest {
        StageRequest::build(
            &StageTemplates::default(),
            stage,
            "What is justice?",
            2026,
            &ContextBag::new(),
        )
    }

    #[tokio::test]
    async fn test_scripted_defaults() {
        let service = ScriptedService::new();

        assert_eq!(service.classify("x").await.unwrap(), "APPROPRIATE");
        assert_eq!(
            service.generate(&request(StageId::TopicStage)).await.unwrap(),
            "topic_stage output"
        );
        assert_eq!(service.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_scripted_stage_error() {
        let service = ScriptedService::new()
            .with_stage_error(StageId::Judgment, ServiceError::transport("down"));

        assert!(service.generate(&request(StageId::Judgment)).await.is_err());
        assert_eq!(service.requests()[0].stage, StageId::Judgment);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.now() - start, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_manual_clock_sleep_advances() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.sleep(Duration::from_secs(90)).await;
        assert_eq!(clock.now() - start, Duration::from_secs(90));
    }
}
