//! Progress event sink trait and implementations.

use super::ProgressEvent;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, Level};

/// Receives progress events from a pipeline run.
///
/// Sinks observe a run; they never influence it. Implementations must not
/// panic, and a sink that cannot deliver an event drops it.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event: &ProgressEvent);

    /// Emits an event without awaiting.
    fn try_emit(&self, event: &ProgressEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: &ProgressEvent) {}

    fn try_emit(&self, _event: &ProgressEvent) {}
}

/// Writes events to `tracing`.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a logging sink at `level`; anything but DEBUG logs at INFO.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, event: &ProgressEvent) {
        let payload = serde_json::to_string(event).unwrap_or_else(|_| format!("{event:?}"));
        if self.level == Level::DEBUG {
            debug!(
                event_type = event.event_type(),
                run_id = %event.run_id(),
                event_data = %payload,
                "Event: {}", event.event_type()
            );
        } else {
            info!(
                event_type = event.event_type(),
                run_id = %event.run_id(),
                event_data = %payload,
                "Event: {}", event.event_type()
            );
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: &ProgressEvent) {
        self.log_event(event);
    }

    fn try_emit(&self, event: &ProgressEvent) {
        self.log_event(event);
    }
}

/// Collects events in memory, for tests and front ends that poll.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<ProgressEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.read().clone()
    }

    /// Returns the event type labels in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.read().iter().map(ProgressEvent::event_type).collect()
    }

    /// Returns events whose type starts with `type_prefix`.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<ProgressEvent> {
        self.events
            .read()
            .iter()
            .filter(|event| event.event_type().starts_with(type_prefix))
            .cloned()
            .collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: &ProgressEvent) {
        self.events.write().push(event.clone());
    }

    fn try_emit(&self, event: &ProgressEvent) {
        self.events.write().push(event.clone());
    }
}
