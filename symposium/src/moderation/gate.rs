//! Pre-flight topic moderation.

use super::verdict::{Classification, RejectionKind, Verdict};
use crate::config::SymposiumConfig;
use crate::errors::{ConfigError, ServiceError};
use crate::logging::{fields, truncate_topic, ContextLogger};
use crate::ratelimit::{with_retry_limit, Quota, RetryLimited};
use crate::service::GenerationService;
use futures::future::{BoxFuture, FutureExt};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default maximum topic length, in characters.
pub const DEFAULT_MAX_TOPIC_LENGTH: usize = 500;

type ClassifyFn = Box<dyn Fn(String) -> BoxFuture<'static, Result<String, ServiceError>> + Send + Sync>;

/// Decides whether a topic may enter the pipeline.
///
/// Blank topics are approved without a service call; over-long topics are
/// rejected locally. Everything else goes to the classifier through a
/// retry rate limiter. A classifier that fails, times out or answers
/// ambiguously never blocks the topic: the gate fails open.
pub struct ModerationGate {
    classifier: RetryLimited<ClassifyFn>,
    max_topic_length: usize,
    logger: ContextLogger,
}

fn classify_with_timeout(service: Arc<dyn GenerationService>, call_timeout: Duration) -> ClassifyFn {
    Box::new(move |topic: String| {
        let service = Arc::clone(&service);
        async move {
            match tokio::time::timeout(call_timeout, service.classify(&topic)).await {
                Ok(reply) => reply,
                Err(_) => Err(ServiceError::Timeout(call_timeout)),
            }
        }
        .boxed()
    })
}

impl ModerationGate {
    /// Creates a gate classifying through `service`.
    ///
    /// At most `quota` classifications run per window; each is bounded by
    /// `call_timeout`.
    #[must_use]
    pub fn new(service: Arc<dyn GenerationService>, quota: Quota, call_timeout: Duration) -> Self {
        Self {
            classifier: with_retry_limit(quota, classify_with_timeout(service, call_timeout)),
            max_topic_length: DEFAULT_MAX_TOPIC_LENGTH,
            logger: ContextLogger::new("symposium.moderation"),
        }
    }

    /// Creates a gate from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the quota or limits are invalid.
    pub fn from_config(
        service: Arc<dyn GenerationService>,
        config: &SymposiumConfig,
    ) -> Result<Self, ConfigError> {
        if config.max_topic_length == 0 {
            return Err(ConfigError::Invalid(
                "max_topic_length must be at least 1".to_string(),
            ));
        }
        let quota = config.moderation_quota.to_quota()?;
        Ok(Self::new(service, quota, config.moderation_timeout())
            .with_max_topic_length(config.max_topic_length))
    }

    /// Sets the maximum topic length in characters.
    #[must_use]
    pub fn with_max_topic_length(mut self, max: usize) -> Self {
        self.max_topic_length = max;
        self
    }

    /// Sets the logger.
    #[must_use]
    pub fn with_logger(mut self, logger: ContextLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Returns the maximum topic length in characters.
    #[must_use]
    pub const fn max_topic_length(&self) -> usize {
        self.max_topic_length
    }

    /// Returns the message shown for an over-long topic.
    #[must_use]
    pub fn too_long_message(&self) -> String {
        format!(
            "Topic is too long. Please keep it concise (under {} characters).",
            self.max_topic_length
        )
    }

    /// Evaluates a candidate topic.
    pub async fn evaluate(&self, topic: &str) -> Verdict {
        let length = topic.chars().count();
        let logger = self.logger.with_context([
            ("topic", json!(truncate_topic(topic))),
            ("topic_length", json!(length)),
        ]);

        if topic.trim().is_empty() {
            logger.info_with(
                "Blank topic approved without moderation",
                fields([("outcome", "approved")]),
            );
            return Verdict::Approved;
        }

        if length > self.max_topic_length {
            let reason = self.too_long_message();
            logger.info_with(
                "Topic rejected - too long",
                fields([("outcome", "rejected"), ("reason", reason.as_str())]),
            );
            return Verdict::Rejected {
                reason,
                kind: RejectionKind::TooLong,
            };
        }

        logger.debug("Starting content moderation");
        let reply = match self.classifier.call(topic.to_string()).await {
            Ok(reply) => reply,
            Err(err) => {
                logger.error_with(
                    "Content moderation error - failing open",
                    fields([("outcome", "approved"), ("error", err.to_string().as_str())]),
                );
                return Verdict::Approved;
            }
        };

        match Classification::parse(&reply) {
            Classification::Appropriate => {
                logger.info_with("Topic approved", fields([("outcome", "approved")]));
                Verdict::Approved
            }
            Classification::Inappropriate(reason) => {
                logger.info_with(
                    "Topic rejected by moderation",
                    fields([("outcome", "rejected"), ("reason", reason.as_str())]),
                );
                Verdict::Rejected {
                    reason,
                    kind: RejectionKind::Moderation,
                }
            }
            Classification::Unclear(response) => {
                logger.debug_with(
                    "Unclear moderation response - allowing",
                    fields([("outcome", "approved"), ("response", response.as_str())]),
                );
                Verdict::Approved
            }
        }
    }
}

impl fmt::Debug for ModerationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModerationGate")
            .field("quota", &self.classifier.window().quota())
            .field("max_topic_length", &self.max_topic_length)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}
