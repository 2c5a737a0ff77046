//! Progress events for pipeline runs.
//!
//! The orchestrator reports each stage start, completion and failure, plus
//! the end of a successful run, through an [`EventSink`]. Front ends use
//! these to show stage outputs as they arrive.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use crate::pipeline::StageId;
use serde::Serialize;
use uuid::Uuid;

/// One observable step of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ProgressEvent {
    /// A stage is about to call the service.
    #[serde(rename = "stage.started")]
    StageStarted {
        /// Run identifier.
        run_id: Uuid,
        /// The stage.
        stage: StageId,
    },
    /// A stage produced its output.
    #[serde(rename = "stage.completed")]
    StageCompleted {
        /// Run identifier.
        run_id: Uuid,
        /// The stage.
        stage: StageId,
        /// The stage output.
        output: String,
        /// Stage duration.
        elapsed_seconds: f64,
    },
    /// A stage failed; the run is aborted.
    #[serde(rename = "stage.failed")]
    StageFailed {
        /// Run identifier.
        run_id: Uuid,
        /// The stage.
        stage: StageId,
        /// Failure description.
        error: String,
        /// Stage duration.
        elapsed_seconds: f64,
    },
    /// All stages completed.
    #[serde(rename = "pipeline.completed")]
    PipelineCompleted {
        /// Run identifier.
        run_id: Uuid,
        /// Total run duration.
        elapsed_seconds: f64,
    },
}

impl ProgressEvent {
    /// Returns the dotted event type label.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::StageStarted { .. } => "stage.started",
            Self::StageCompleted { .. } => "stage.completed",
            Self::StageFailed { .. } => "stage.failed",
            Self::PipelineCompleted { .. } => "pipeline.completed",
        }
    }

    /// Returns the run this event belongs to.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        match self {
            Self::StageStarted { run_id, .. }
            | Self::StageCompleted { run_id, .. }
            | Self::StageFailed { run_id, .. }
            | Self::PipelineCompleted { run_id, .. } => *run_id,
        }
    }

    /// Returns the stage, for stage events.
    #[must_use]
    pub const fn stage(&self) -> Option<StageId> {
        match self {
            Self::StageStarted { stage, .. }
            | Self::StageCompleted { stage, .. }
            | Self::StageFailed { stage, .. } => Some(*stage),
            Self::PipelineCompleted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_dotted_type() {
        let event = ProgressEvent::StageFailed {
            run_id: Uuid::nil(),
            stage: StageId::FirstInquiry,
            error: "boom".to_string(),
            elapsed_seconds: 1.0,
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "stage.failed");
        assert_eq!(value["stage"], "first_inquiry");
        assert_eq!(event.event_type(), "stage.failed");
        assert_eq!(event.stage(), Some(StageId::FirstInquiry));
    }
}
