//! # Symposium
//!
//! A runtime for moderated, multi-stage dialogue generation.
//!
//! A request flows through two gates:
//!
//! - **Moderation**: a pre-flight content check that rejects over-long or
//!   unsuitable topics and fails open when the classifier is unavailable
//! - **Pipeline**: four stages run in a fixed order, each making one call to
//!   the generation service and reading only the outputs of earlier stages
//!
//! Calls to the classifier are rate limited with a sliding window, and every
//! stage is timed through a context-carrying structured logger.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use symposium::prelude::*;
//!
//! let config = SymposiumConfig::load(None)?;
//! init_logging(&config.logging)?;
//!
//! let service = Arc::new(AnthropicService::from_env()?);
//! let runner = DialogueRunner::new(service, &config)?;
//!
//! let dialogue = runner.run("What is justice?").await?;
//! for (title, text) in dialogue.sections() {
//!     println!("## {title}\n\n{text}\n");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod dialogue;
pub mod errors;
pub mod events;
pub mod logging;
pub mod moderation;
pub mod pipeline;
pub mod ratelimit;
pub mod service;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{QuotaConfig, SymposiumConfig};
    pub use crate::dialogue::{current_year, Dialogue, DialogueRunner};
    pub use crate::errors::{
        ConfigError, DialogueError, PipelineError, RateLimitExceeded, ServiceError, StageFailure,
    };
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, ProgressEvent,
    };
    pub use crate::logging::{
        init_logging, with_timing, ContextLogger, LogFormat, LogLevel, LoggingConfig,
    };
    pub use crate::moderation::{
        alternative_suggestions, rejection_guidelines, themed_suggestions, ModerationGate,
        Verdict,
    };
    pub use crate::pipeline::{ContextBag, Orchestrator, StageId, StageRequest, StageTemplates};
    pub use crate::ratelimit::{with_fail_fast_limit, with_retry_limit, Quota};
    #[cfg(feature = "anthropic")]
    pub use crate::service::AnthropicService;
    pub use crate::service::GenerationService;
}
