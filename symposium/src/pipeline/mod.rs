//! The four-stage dialogue pipeline.
//!
//! This module provides:
//! - [`StageId`]: the fixed stage order
//! - [`StageTemplates`] and [`StageRequest`]: what each stage asks for
//! - [`ContextBag`]: append-only stage outputs for one run
//! - [`Orchestrator`]: runs the stages in order and aborts on first failure

mod bag;
mod orchestrator;
mod stage;

pub use bag::ContextBag;
pub use orchestrator::{Orchestrator, DEFAULT_STAGE_TIMEOUT};
pub use stage::{StageId, StageRequest, StageTemplates, OPEN_TOPIC_DIRECTIVE};
