//! Chainable context logger.

use super::sink::{LogSink, TracingSink};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Structured key/value fields attached to a log event.
pub type Fields = BTreeMap<String, serde_json::Value>;

/// Builds a [`Fields`] map from key/value pairs.
pub fn fields<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<serde_json::Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected that was handled.
    Warning,
    /// An operation failed.
    Error,
}

impl LogLevel {
    /// Returns the level label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable context attached to a logger.
///
/// Extending a context copies the map into a new allocation; the parent is
/// never touched, so loggers derived from the same parent cannot observe
/// each other's keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogContext {
    entries: Arc<Fields>,
}

impl LogContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new context holding `self ∪ extra`, `extra` winning on collision.
    #[must_use]
    pub fn extend(&self, extra: Fields) -> Self {
        if extra.is_empty() {
            return self.clone();
        }
        let mut merged = (*self.entries).clone();
        merged.extend(extra);
        Self {
            entries: Arc::new(merged),
        }
    }

    /// Returns the merged fields for one event without storing them.
    #[must_use]
    pub fn merged_with(&self, extra: Option<&Fields>) -> Fields {
        let mut merged = (*self.entries).clone();
        if let Some(extra) = extra {
            merged.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    /// Gets a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.entries.get(key)
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns all keys in sorted order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the context is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single log event as handed to a [`LogSink`].
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub level: LogLevel,
    /// Name of the emitting logger.
    pub logger: String,
    /// Human-readable message.
    pub message: String,
    /// Logger context merged with per-event extras.
    pub fields: Fields,
}

/// A named logger carrying immutable context.
///
/// # Example
///
/// ```rust,ignore
/// let logger = ContextLogger::new("symposium.pipeline");
/// let stage_logger = logger.with_context([("stage", "judgment")]);
/// stage_logger.info("Evaluating inquiries");
/// ```
#[derive(Clone)]
pub struct ContextLogger {
    name: Arc<str>,
    context: LogContext,
    sink: Arc<dyn LogSink>,
}

impl ContextLogger {
    /// Creates a logger with an empty context writing to `tracing`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_initial(name, Fields::new())
    }

    /// Creates a logger with an initial context.
    #[must_use]
    pub fn with_initial(name: impl Into<String>, context: Fields) -> Self {
        Self {
            name: Arc::from(name.into()),
            context: LogContext::new().extend(context),
            sink: Arc::new(TracingSink),
        }
    }

    /// Replaces the sink events are written to.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns a new logger whose context is `self ∪ extra`.
    ///
    /// The receiver is left unchanged.
    #[must_use]
    pub fn with_context<I, K, V>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        Self {
            name: Arc::clone(&self.name),
            context: self.context.extend(fields(extra)),
            sink: Arc::clone(&self.sink),
        }
    }

    /// Returns a logger named `{self.name}.{suffix}` with the same context and sink.
    #[must_use]
    pub fn child(&self, suffix: &str) -> Self {
        Self {
            name: Arc::from(format!("{}.{suffix}", self.name)),
            context: self.context.clone(),
            sink: Arc::clone(&self.sink),
        }
    }

    /// Returns the logger name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the logger context.
    #[must_use]
    pub fn context(&self) -> &LogContext {
        &self.context
    }

    /// Emits an event at `level` with optional per-event fields.
    pub fn log(&self, level: LogLevel, message: impl Into<String>, extra: Option<&Fields>) {
        let record = LogRecord {
            timestamp: Utc::now(),
            level,
            logger: self.name.to_string(),
            message: message.into(),
            fields: self.context.merged_with(extra),
        };
        self.sink.emit(&record);
    }

    /// Emits a DEBUG event.
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message, None);
    }

    /// Emits an INFO event.
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message, None);
    }

    /// Emits a WARNING event.
    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message, None);
    }

    /// Emits an ERROR event.
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message, None);
    }

    /// Emits a DEBUG event with extra fields.
    pub fn debug_with(&self, message: impl Into<String>, extra: Fields) {
        self.log(LogLevel::Debug, message, Some(&extra));
    }

    /// Emits an INFO event with extra fields.
    pub fn info_with(&self, message: impl Into<String>, extra: Fields) {
        self.log(LogLevel::Info, message, Some(&extra));
    }

    /// Emits a WARNING event with extra fields.
    pub fn warning_with(&self, message: impl Into<String>, extra: Fields) {
        self.log(LogLevel::Warning, message, Some(&extra));
    }

    /// Emits an ERROR event with extra fields.
    pub fn error_with(&self, message: impl Into<String>, extra: Fields) {
        self.log(LogLevel::Error, message, Some(&extra));
    }
}

impl fmt::Debug for ContextLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextLogger")
            .field("name", &self.name)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::CollectingSink;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn collecting_logger(name: &str) -> (ContextLogger, Arc<CollectingSink>) {
        let sink = Arc::new(CollectingSink::new());
        let logger = ContextLogger::new(name).with_sink(sink.clone());
        (logger, sink)
    }

    #[test]
    fn test_with_context_does_not_mutate_receiver() {
        let (base, sink) = collecting_logger("test");
        let left = base.with_context([("request", "a")]);
        let right = base.with_context([("session", "b")]);

        base.info("from base");
        left.info("from left");
        right.info("from right");

        let records = sink.records();
        assert!(records[0].fields.is_empty());
        assert_eq!(records[1].fields.get("request"), Some(&json!("a")));
        assert!(!records[1].fields.contains_key("session"));
        assert_eq!(records[2].fields.get("session"), Some(&json!("b")));
        assert!(!records[2].fields.contains_key("request"));
    }

    #[test]
    fn test_derived_context_is_superset_of_parent() {
        let parent = ContextLogger::with_initial("test", fields([("topic", "justice")]));
        let child = parent.with_context([("stage", "judgment")]);

        for key in parent.context().keys() {
            assert!(child.context().contains_key(&key));
        }
        assert_eq!(child.context().len(), 2);
    }

    #[test]
    fn test_extra_overrides_existing_key() {
        let logger = ContextLogger::new("test").with_context([("topic", "old")]);
        let overridden = logger.with_context([("topic", "new")]);

        assert_eq!(overridden.context().get("topic"), Some(&json!("new")));
        assert_eq!(logger.context().get("topic"), Some(&json!("old")));
    }

    #[test]
    fn test_event_extra_merges_without_sticking() {
        let (logger, sink) = collecting_logger("test");
        let logger = logger.with_context([("run_id", "r1")]);

        logger.warning_with("slow call", fields([("elapsed_seconds", json!(1.5))]));
        logger.info("next");

        let records = sink.records();
        assert_eq!(records[0].level, LogLevel::Warning);
        assert_eq!(records[0].fields.len(), 2);
        assert_eq!(records[1].fields.len(), 1);
    }

    #[test]
    fn test_child_extends_name_and_keeps_context() {
        let logger = ContextLogger::new("symposium").with_context([("run_id", "r1")]);
        let child = logger.child("moderation");

        assert_eq!(child.name(), "symposium.moderation");
        assert!(child.context().contains_key("run_id"));
    }

    #[test]
    fn test_level_labels() {
        assert_eq!(LogLevel::Debug.to_string(), "DEBUG");
        assert_eq!(LogLevel::Warning.as_str(), "WARNING");
        assert!(LogLevel::Error > LogLevel::Info);
    }
}
