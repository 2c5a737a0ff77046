//! Timed execution of named operations.

use super::logger::{ContextLogger, Fields};
use serde_json::json;
use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

/// Wall-clock timer for a named operation.
#[derive(Debug)]
pub struct OperationTimer {
    start: Instant,
    name: String,
}

impl OperationTimer {
    /// Starts a new timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in seconds.
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Returns the operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Runs `body`, logging its start, completion and duration.
///
/// Logs INFO `Starting {operation}` before polling `body`, then either INFO
/// `Completed {operation} in {elapsed}s` or ERROR
/// `Failed {operation} after {elapsed}s: {error}`. The error is returned to
/// the caller unchanged.
pub async fn with_timing<F, T, E>(
    logger: &ContextLogger,
    operation: &str,
    extra: Fields,
    body: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    let timer = OperationTimer::start(operation);

    let mut start_fields = extra.clone();
    start_fields.insert("operation".to_string(), json!(timer.name()));
    logger.info_with(format!("Starting {operation}"), start_fields);

    let outcome = body.await;
    let elapsed = timer.elapsed_secs();

    let mut end_fields = extra;
    end_fields.insert("operation".to_string(), json!(timer.name()));
    end_fields.insert("elapsed_seconds".to_string(), json!(elapsed));

    match outcome {
        Ok(value) => {
            logger.info_with(
                format!("Completed {operation} in {elapsed:.2}s"),
                end_fields,
            );
            Ok(value)
        }
        Err(err) => {
            end_fields.insert("error".to_string(), json!(err.to_string()));
            logger.error_with(
                format!("Failed {operation} after {elapsed:.2}s: {err}"),
                end_fields,
            );
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{fields, CollectingSink, LogLevel};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Debug, PartialEq, Eq)]
    struct Boom(u8);

    impl Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "boom {}", self.0)
        }
    }

    fn collecting_logger() -> (ContextLogger, Arc<CollectingSink>) {
        let sink = Arc::new(CollectingSink::new());
        (ContextLogger::new("test").with_sink(sink.clone()), sink)
    }

    #[tokio::test]
    async fn test_success_logs_start_and_one_completion() {
        let (logger, sink) = collecting_logger();

        let result: Result<u32, Boom> =
            with_timing(&logger, "crew_execution", fields([("topic", "justice")]), async {
                Ok(7)
            })
            .await;

        assert_eq!(result, Ok(7));
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "Starting crew_execution");
        assert_eq!(sink.with_message_prefix("Completed crew_execution in").len(), 1);
        assert!(sink.at_level(LogLevel::Error).is_empty());
        assert_eq!(records[1].fields["topic"], "justice");
    }

    #[tokio::test]
    async fn test_failure_logs_one_error_and_returns_same_error() {
        let (logger, sink) = collecting_logger();

        let result: Result<(), Boom> = with_timing(&logger, "judge", Fields::new(), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Err(Boom(3))
        })
        .await;

        assert_eq!(result, Err(Boom(3)));
        let errors = sink.at_level(LogLevel::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("Failed judge after "));
        assert!(errors[0].message.ends_with(": boom 3"));
        let elapsed = errors[0].fields["elapsed_seconds"].as_f64().unwrap();
        assert!(elapsed >= 0.0);
        assert!(sink.with_message_prefix("Completed").is_empty());
    }

    #[tokio::test]
    async fn test_elapsed_reflects_body_duration() {
        let (logger, sink) = collecting_logger();

        let _: Result<(), Boom> = with_timing(&logger, "wait", Fields::new(), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(())
        })
        .await;

        let done = sink.with_message_prefix("Completed");
        let elapsed = done[0].fields["elapsed_seconds"].as_f64().unwrap();
        assert!(elapsed >= 0.02);
    }

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::start("op");
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed_secs() >= 0.01);
        assert_eq!(timer.name(), "op");
    }
}
