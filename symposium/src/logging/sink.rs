//! Log sinks: where [`ContextLogger`](super::ContextLogger) events end up.

use super::logger::{Fields, LogLevel, LogRecord};
use parking_lot::RwLock;
use tracing::Level;

/// Destination for log records.
///
/// Implementations must never panic or block for long; a record that cannot
/// be written is dropped or degraded, never propagated to the caller.
pub trait LogSink: Send + Sync {
    /// Writes one record.
    fn emit(&self, record: &LogRecord);
}

/// Renders context fields for a single-field log payload.
///
/// Falls back to the `Debug` representation if JSON serialization fails.
#[must_use]
pub fn render_fields(fields: &Fields) -> String {
    serde_json::to_string(fields).unwrap_or_else(|_| format!("{fields:?}"))
}

/// Forwards records to the `tracing` ecosystem.
///
/// The installed subscriber decides the encoding (see
/// [`init_logging`](super::init_logging)). The merged context travels as the
/// `context` field; the JSON encoding writes it back out as an object.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

macro_rules! forward {
    ($level:expr, $logger:expr, $context:expr, $message:expr) => {
        tracing::event!(
            target: "symposium",
            $level,
            logger = %$logger,
            context = %$context,
            "{}",
            $message
        )
    };
}

impl LogSink for TracingSink {
    fn emit(&self, record: &LogRecord) {
        let context = render_fields(&record.fields);
        match record.level {
            LogLevel::Debug => forward!(Level::DEBUG, record.logger, context, record.message),
            LogLevel::Info => forward!(Level::INFO, record.logger, context, record.message),
            LogLevel::Warning => forward!(Level::WARN, record.logger, context, record.message),
            LogLevel::Error => forward!(Level::ERROR, record.logger, context, record.message),
        }
    }
}

/// A collecting sink for tests and embedders that inspect events.
#[derive(Debug, Default)]
pub struct CollectingSink {
    records: RwLock<Vec<LogRecord>>,
}

impl CollectingSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected records.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.read().clone()
    }

    /// Returns records at the given level.
    #[must_use]
    pub fn at_level(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| r.level == level)
            .cloned()
            .collect()
    }

    /// Returns records whose message starts with `prefix`.
    #[must_use]
    pub fn with_message_prefix(&self, prefix: &str) -> Vec<LogRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| r.message.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Returns the number of collected records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Clears all collected records.
    pub fn clear(&self) {
        self.records.write().clear();
    }
}

impl LogSink for CollectingSink {
    fn emit(&self, record: &LogRecord) {
        self.records.write().push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{fields, ContextLogger};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_tracing_sink_without_subscriber() {
        let logger = ContextLogger::new("test").with_context([("k", "v")]);
        logger.debug("debug");
        logger.error("error");
        // Should not panic
    }

    #[test]
    fn test_collecting_sink_filters() {
        let sink = Arc::new(CollectingSink::new());
        let logger = ContextLogger::new("test").with_sink(sink.clone());

        logger.info("Starting x");
        logger.error("Failed x");
        logger.info("Completed x");

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.at_level(LogLevel::Info).len(), 2);
        assert_eq!(sink.with_message_prefix("Failed").len(), 1);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_render_fields_is_json() {
        let rendered = render_fields(&fields([("stage", json!("judgment")), ("n", json!(2))]));
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["stage"], "judgment");
        assert_eq!(parsed["n"], 2);
    }
}
