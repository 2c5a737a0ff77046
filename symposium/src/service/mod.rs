//! The external text-generation service boundary.
//!
//! Everything the runtime needs from a language model goes through
//! [`GenerationService`]: one classification call per topic and one
//! generation call per stage. Failures are uniformly [`ServiceError`].

#[cfg(feature = "anthropic")]
mod anthropic;

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicService, DEFAULT_GENERATION_MODEL, MODERATION_MODEL};

use crate::errors::ServiceError;
use crate::pipeline::StageRequest;
use async_trait::async_trait;

/// A text-generation backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Classifies a candidate topic and returns the raw classifier reply.
    ///
    /// The reply is interpreted by the moderation gate; implementations do
    /// not parse it.
    async fn classify(&self, topic: &str) -> Result<String, ServiceError>;

    /// Produces the output for one pipeline stage.
    async fn generate(&self, request: &StageRequest) -> Result<String, ServiceError>;
}
