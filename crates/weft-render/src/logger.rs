//! Structured logging for components and the engine.
//!
//! Components log through a [`ComponentLogger`] obtained from their
//! context. It stamps every record with the component's name, its props
//! and the correlation id of the top-level render, then hands the record
//! to the context's [`Logger`] sink.
//!
//! ```text
//! Component ──► ComponentLogger ──► LogRecord ──► dyn Logger
//!                 (name, props,                     ├── TracingLogger (default)
//!                  render_id)                       └── MemoryLogger  (tests, embedders)
//! ```
//!
//! The engine itself logs through the same sink when a boundary recovers
//! (`Warn`) or when a top-level render fails (`Error`).

use crate::config::LoggingConfig;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use weft_event::{LogLevel, LogPayload, LogRecord};
use weft_types::{ErrorCode, RenderId};

/// Sink for [`LogRecord`]s.
pub trait Logger: Send + Sync {
    /// Consumes one record.
    fn log(&self, record: &LogRecord);
}

/// Forwards records to `tracing`, dropping those below a minimum level.
#[derive(Debug, Clone, Copy)]
pub struct TracingLogger {
    min_level: LogLevel,
}

impl TracingLogger {
    /// Creates a logger forwarding records at `min_level` and above.
    #[must_use]
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

macro_rules! forward {
    ($macro:ident, $record:expr) => {
        match &$record.payload {
            LogPayload::Message(message) => tracing::$macro!(
                target: "weft::component",
                component = %$record.component,
                render_id = %$record.render_id,
                props = %$record.props,
                "{message}"
            ),
            LogPayload::Metadata(metadata) => tracing::$macro!(
                target: "weft::component",
                component = %$record.component,
                render_id = %$record.render_id,
                props = %$record.props,
                metadata = %metadata,
                "metadata"
            ),
        }
    };
}

impl Logger for TracingLogger {
    fn log(&self, record: &LogRecord) {
        if record.level < self.min_level {
            return;
        }
        match record.level {
            LogLevel::Trace => forward!(trace, record),
            LogLevel::Debug => forward!(debug, record),
            LogLevel::Info => forward!(info, record),
            LogLevel::Warn => forward!(warn, record),
            LogLevel::Error => forward!(error, record),
        }
    }
}

/// Collects records in memory.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use weft_event::LogLevel;
/// use weft_render::{MemoryLogger, Props, RenderContext};
///
/// let logger = Arc::new(MemoryLogger::new());
/// let ctx = RenderContext::new().with_logger(logger.clone());
/// ctx.component_logger("Search", &Props::new().attr("q", "rust")).info("querying");
///
/// let records = logger.records();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].component, "Search");
/// assert_eq!(records[0].props["q"], "rust");
/// assert_eq!(logger.at_level(LogLevel::Info).len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    /// Creates an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all records so far.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Returns records at exactly `level`.
    #[must_use]
    pub fn at_level(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .cloned()
            .collect()
    }

    /// Removes all records.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, record: &LogRecord) {
        self.records.lock().push(record.clone());
    }
}

/// Logger bound to one component's identity within one render.
#[derive(Clone)]
pub struct ComponentLogger {
    sink: Arc<dyn Logger>,
    component: String,
    props: Value,
    render_id: RenderId,
}

impl ComponentLogger {
    pub(crate) fn new(
        sink: Arc<dyn Logger>,
        component: &str,
        props: Value,
        render_id: RenderId,
    ) -> Self {
        Self {
            sink,
            component: component.to_string(),
            props,
            render_id,
        }
    }

    /// Logs a message at `level`.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let record = LogRecord::message(level, self.component.clone(), self.render_id, message)
            .with_props(self.props.clone());
        self.sink.log(&record);
    }

    /// Logs a metadata object at `level`.
    pub fn metadata(&self, level: LogLevel, metadata: Value) {
        let record = LogRecord::metadata(level, self.component.clone(), self.render_id, metadata)
            .with_props(self.props.clone());
        self.sink.log(&record);
    }

    /// Logs at `Trace`.
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    /// Logs at `Debug`.
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    /// Logs at `Info`.
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    /// Logs at `Warn`.
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    /// Logs at `Error`.
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Returns the render correlation id stamped on records.
    #[must_use]
    pub fn render_id(&self) -> RenderId {
        self.render_id
    }
}

/// Errors from [`init_tracing`].
#[derive(Debug, Error)]
pub enum TracingInitError {
    /// The configured filter directive did not parse.
    #[error("invalid tracing filter '{filter}': {message}")]
    InvalidFilter {
        /// The directive as configured.
        filter: String,
        /// Parser message.
        message: String,
    },

    /// A global subscriber was already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

impl ErrorCode for TracingInitError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidFilter { .. } => "TRACING_INVALID_FILTER",
            Self::AlreadyInstalled(_) => "TRACING_ALREADY_INSTALLED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::AlreadyInstalled(_))
    }
}

/// Installs a global `tracing` fmt subscriber.
///
/// `RUST_LOG` overrides the configured filter when set.
///
/// # Errors
///
/// Returns an error when the filter is invalid or a subscriber exists.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TracingInitError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter).map_err(|e| TracingInitError::InvalidFilter {
            filter: config.filter.clone(),
            message: e.to_string(),
        })?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| TracingInitError::AlreadyInstalled(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use weft_types::assert_error_codes;

    #[test]
    fn component_logger_stamps_identity() {
        let sink = Arc::new(MemoryLogger::new());
        let id = RenderId::new();
        let logger = ComponentLogger::new(sink.clone(), "Chat", json!({"model": "m"}), id);
        logger.warn("slow");
        logger.metadata(LogLevel::Debug, json!({"tokens": 12}));

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, LogLevel::Warn);
        assert_eq!(records[0].text(), Some("slow"));
        assert_eq!(records[0].render_id, id);
        assert_eq!(records[0].props, json!({"model": "m"}));
        assert_eq!(records[1].payload, LogPayload::Metadata(json!({"tokens": 12})));
    }

    #[test]
    fn memory_logger_filters_and_clears() {
        let sink = MemoryLogger::new();
        sink.log(&LogRecord::message(LogLevel::Info, "a", RenderId::new(), "x"));
        sink.log(&LogRecord::message(LogLevel::Error, "a", RenderId::new(), "y"));
        assert_eq!(sink.at_level(LogLevel::Error).len(), 1);
        sink.clear();
        assert!(sink.records().is_empty());
    }

    #[test]
    fn tracing_logger_accepts_all_levels() {
        let logger = TracingLogger::new(LogLevel::Trace);
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            logger.log(&LogRecord::message(level, "c", RenderId::new(), "m"));
        }
    }

    #[test]
    fn tracing_error_codes_valid() {
        let errors = vec![
            TracingInitError::InvalidFilter {
                filter: "x".into(),
                message: "y".into(),
            },
            TracingInitError::AlreadyInstalled("x".into()),
        ];
        assert_error_codes(&errors, "TRACING_");
    }
}
