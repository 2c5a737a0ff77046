//! Error types for the symposium runtime.
//!
//! Each concern gets its own error type: external service calls, rate
//! limiting, stage execution, configuration, and the top-level dialogue
//! outcome shown to callers.

use crate::pipeline::StageId;
use std::time::Duration;
use thiserror::Error;

/// A call to the external generation service failed.
///
/// The runtime never inspects provider-specific detail; every variant is
/// treated as "call failed" by the moderation gate and the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The call did not complete within its deadline.
    #[error("Service call timed out after {0:?}")]
    Timeout(Duration),

    /// The request could not be delivered or the connection failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with something that could not be decoded.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The service answered with a non-success status.
    #[error("Service returned status {status}: {message}")]
    Status {
        /// HTTP-style status code.
        status: u16,
        /// Body or reason returned alongside the status.
        message: String,
    },
}

impl ServiceError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a malformed-response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

/// Raised by a fail-fast limiter when its window is full.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Rate limit exceeded: {calls} calls per {period:?}, next slot in {retry_after:?}")]
pub struct RateLimitExceeded {
    /// Maximum calls admitted per period.
    pub calls: u32,
    /// Length of the sliding window.
    pub period: Duration,
    /// Time until the oldest recorded call leaves the window.
    pub retry_after: Duration,
}

/// A stage output was recorded out of the fixed stage order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Stage '{attempted}' recorded out of order (expected {})",
    .expected.map_or("no further stages", StageId::as_str)
)]
pub struct BagOrderError {
    /// The stage whose output was offered.
    pub attempted: StageId,
    /// The only stage the bag would have accepted next.
    pub expected: Option<StageId>,
}

/// Why a single stage failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageFailure {
    /// The generation call itself failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The service answered, but with nothing usable.
    #[error("Stage produced empty output")]
    EmptyOutput,

    /// The output could not be appended to the context bag.
    #[error(transparent)]
    OutOfOrder(#[from] BagOrderError),
}

/// A pipeline run aborted at a specific stage.
///
/// Outputs of the stages that completed before the failure are discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Stage '{stage}' failed: {cause}")]
pub struct PipelineError {
    /// The stage that failed.
    pub stage: StageId,
    /// The underlying cause.
    #[source]
    pub cause: StageFailure,
}

impl PipelineError {
    /// Creates a new pipeline error.
    #[must_use]
    pub fn new(stage: StageId, cause: impl Into<StageFailure>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }
}

/// Invalid or unloadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A rate quota with zero calls or a zero period.
    #[error("Invalid quota: {0}")]
    InvalidQuota(String),

    /// A stage template references something it may not read.
    #[error("Invalid template for stage '{stage}': {message}")]
    InvalidTemplate {
        /// The stage owning the template.
        stage: StageId,
        /// What is wrong with it.
        message: String,
    },

    /// Any other invalid setting.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A required environment variable is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnv(String),

    /// The global log subscriber could not be installed.
    #[error("Logging initialization failed: {0}")]
    LoggingInit(String),

    /// A configuration source could not be read or did not fit the schema.
    #[error("Configuration source error: {0}")]
    Source(#[from] ::config::ConfigError),
}

/// Outcome of a dialogue request that produced no dialogue.
#[derive(Debug, Clone, Error)]
pub enum DialogueError {
    /// The topic failed a local check and never reached the service.
    #[error("{message}")]
    Validation {
        /// User-facing explanation.
        message: String,
        /// Topics to offer instead.
        suggestions: Vec<String>,
    },

    /// The moderation classifier rejected the topic.
    #[error("Topic rejected: {reason}")]
    Rejected {
        /// Reason given by the classifier.
        reason: String,
        /// Topics to offer instead.
        suggestions: Vec<String>,
    },

    /// A generation stage failed and the run was aborted.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl DialogueError {
    /// Returns a short machine-friendly kind label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Rejected { .. } => "rejected",
            Self::Pipeline(_) => "pipeline",
        }
    }

    /// Returns the message to show an end user.
    ///
    /// Pipeline failures collapse to one generic message; the failing stage
    /// and cause stay in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::Rejected { reason, .. } => {
                format!("This topic may not be appropriate: {reason}")
            }
            Self::Pipeline(_) => {
                "Something went wrong while generating the dialogue. Please try again.".to_string()
            }
        }
    }

    /// Returns the alternative topics attached to a rejection.
    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::Validation { suggestions, .. } | Self::Rejected { suggestions, .. } => suggestions,
            Self::Pipeline(_) => &[],
        }
    }
}
