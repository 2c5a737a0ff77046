//! Process-wide log subscriber configuration.
//!
//! Logging is configured once at startup from a [`LoggingConfig`] value.
//! The encoding is either human-readable lines or one JSON object per line;
//! both carry the same message, level, logger name and context. In JSON the
//! context is a nested object.

use crate::errors::ConfigError;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::{fmt as fmt_layer, layer::SubscriberExt, EnvFilter, Registry};

/// Field carrying the rendered logger context.
const CONTEXT_FIELD: &str = "context";

/// Output encoding for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "human" | "pretty" => Ok(Self::Text),
            "json" | "structured" => Ok(Self::Json),
            other => Err(ConfigError::Invalid(format!(
                "unknown log format '{other}' (expected 'text' or 'json')"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive: a level (`debug`, `info`, ...) or a full `EnvFilter` string.
    pub level: String,
    /// Output encoding.
    pub format: LogFormat,
    /// Colorize text output.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Sets the output encoding.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Enables or disables ANSI colors.
    #[must_use]
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }
}

/// Builds a subscriber for `config` writing to `writer`.
///
/// # Errors
///
/// Returns `ConfigError::Invalid` if the level directive does not parse.
pub fn build_subscriber<W>(
    config: &LoggingConfig,
    writer: W,
) -> Result<Box<dyn Subscriber + Send + Sync>, ConfigError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_new(&config.level).map_err(|e| {
        ConfigError::Invalid(format!("invalid log level '{}': {e}", config.level))
    })?;

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.format {
        LogFormat::Json => Box::new(
            Registry::default()
                .with(filter)
                .with(JsonLines { writer }),
        ),
        LogFormat::Text => Box::new(
            Registry::default().with(filter).with(
                fmt_layer::layer()
                    .with_target(true)
                    .with_ansi(config.ansi)
                    .with_writer(writer),
            ),
        ),
    };

    Ok(subscriber)
}

/// Writes each event as one JSON object per line.
///
/// Event fields sit at the top level next to `timestamp`, `level`, `target`
/// and `message`. The `context` field is written as an object.
struct JsonLines<W> {
    writer: W,
}

impl<S, W> Layer<S> for JsonLines<W>
where
    S: Subscriber,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut object = Map::new();
        object.insert(
            "timestamp".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        object.insert("level".to_string(), Value::from(meta.level().to_string()));
        object.insert("target".to_string(), Value::from(meta.target()));
        event.record(&mut JsonVisitor(&mut object));

        let Ok(mut line) = serde_json::to_vec(&object) else {
            return;
        };
        line.push(b'\n');
        // A line that cannot be written is dropped.
        let _ = self.writer.make_writer_for(meta).write_all(&line);
    }
}

struct JsonVisitor<'a>(&'a mut Map<String, Value>);

impl JsonVisitor<'_> {
    fn insert(&mut self, field: &Field, value: Value) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl Visit for JsonVisitor<'_> {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        let value = if field.name() == CONTEXT_FIELD {
            serde_json::from_str::<Value>(&rendered)
                .ok()
                .filter(Value::is_object)
                .unwrap_or(Value::String(rendered))
        } else {
            Value::String(rendered)
        };
        self.insert(field, value);
    }
}

/// Installs the global subscriber for the process, writing to stderr.
///
/// `RUST_LOG`, when set, overrides `config.level`.
///
/// # Errors
///
/// Returns `ConfigError::LoggingInit` if a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let mut effective = config.clone();
    if let Ok(directive) = std::env::var("RUST_LOG") {
        if !directive.trim().is_empty() {
            effective.level = directive;
        }
    }

    let subscriber = build_subscriber(&effective, std::io::stderr)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ConfigError::LoggingInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::ContextLogger;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    impl io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(config: &LoggingConfig, emit: impl FnOnce()) -> String {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = build_subscriber(config, move || writer.clone()).unwrap();
        tracing::subscriber::with_default(subscriber, emit);
        buffer.contents()
    }

    fn emit_sample() {
        ContextLogger::new("symposium.test")
            .with_context([("topic", "justice")])
            .info("Topic approved");
    }

    #[test]
    fn test_json_format_emits_one_object_per_line() {
        let config = LoggingConfig::new().with_format(LogFormat::Json);
        let output = capture(&config, emit_sample);

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 1);
        let event: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(event["message"], "Topic approved");
        assert_eq!(event["level"], "INFO");
        assert_eq!(event["logger"], "symposium.test");
        assert!(event["timestamp"].is_string());
        assert!(event["context"].is_object());
        assert_eq!(event["context"]["topic"], "justice");
    }

    #[test]
    fn test_json_format_keeps_context_value_types() {
        let config = LoggingConfig::new().with_format(LogFormat::Json);
        let output = capture(&config, || {
            ContextLogger::new("symposium.pipeline")
                .with_context([("stage", serde_json::json!("judgment"))])
                .info_with(
                    "Completed stage_judgment in 0.25s",
                    crate::logging::fields([("elapsed_seconds", serde_json::json!(0.25))]),
                );
            tracing::debug!(target: "symposium", calls = 3u32, "Rate-limited call");
        });

        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["context"]["stage"], "judgment");
        assert_eq!(lines[0]["context"]["elapsed_seconds"], 0.25);
        assert_eq!(lines[0]["target"], "symposium");
    }

    #[test]
    fn test_json_format_records_plain_fields() {
        let config = LoggingConfig::new()
            .with_format(LogFormat::Json)
            .with_level("debug");
        let output = capture(&config, || {
            tracing::debug!(target: "symposium", calls = 3u32, ok = true, "Rate-limited call");
        });

        let event: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(event["calls"], 3);
        assert_eq!(event["ok"], true);
        assert_eq!(event["message"], "Rate-limited call");
        assert_eq!(event["level"], "DEBUG");
    }

    #[test]
    fn test_text_format_carries_same_content() {
        let config = LoggingConfig::new().with_ansi(false);
        let output = capture(&config, emit_sample);

        assert!(output.contains("INFO"));
        assert!(output.contains("Topic approved"));
        assert!(output.contains("symposium.test"));
        assert!(output.contains("justice"));
        assert!(serde_json::from_str::<serde_json::Value>(output.trim()).is_err());
    }

    #[test]
    fn test_level_filter_applies() {
        let config = LoggingConfig::new().with_level("warn").with_ansi(false);
        let output = capture(&config, || {
            let logger = ContextLogger::new("test");
            logger.info("hidden");
            logger.warning("shown");
        });

        assert!(!output.contains("hidden"));
        assert!(output.contains("shown"));
    }

    #[test]
    fn test_invalid_level_is_config_error() {
        let config = LoggingConfig::new().with_level("symposium=loudest");
        assert!(build_subscriber(&config, io::sink).is_err());
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }
}
