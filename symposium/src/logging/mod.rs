//! Structured, context-chaining logging.
//!
//! [`ContextLogger`] attaches immutable key/value context to every event and
//! hands records to a [`LogSink`]. By default records go to `tracing`, whose
//! subscriber is installed once per process by [`init_logging`].
//! [`with_timing`] wraps an operation with start/completion/failure events.

mod logger;
mod setup;
mod sink;
mod timing;

pub use logger::{fields, ContextLogger, Fields, LogContext, LogLevel, LogRecord};
pub use setup::{build_subscriber, init_logging, LogFormat, LoggingConfig};
pub use sink::{render_fields, CollectingSink, LogSink, TracingSink};
pub use timing::{with_timing, OperationTimer};

/// Maximum number of topic characters copied into log context.
pub const TOPIC_LOG_CHARS: usize = 50;

/// Truncates a topic for log hygiene.
#[must_use]
pub fn truncate_topic(topic: &str) -> String {
    let mut chars = topic.chars();
    let head: String = chars.by_ref().take(TOPIC_LOG_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_topic_short() {
        assert_eq!(truncate_topic("What is justice?"), "What is justice?");
    }

    #[test]
    fn test_truncate_topic_long() {
        let topic = "a".repeat(120);
        let truncated = truncate_topic(&topic);
        assert_eq!(truncated.len(), TOPIC_LOG_CHARS + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_topic_multibyte() {
        let topic = "é".repeat(60);
        let truncated = truncate_topic(&topic);
        assert_eq!(truncated.chars().count(), TOPIC_LOG_CHARS + 3);
    }
}
