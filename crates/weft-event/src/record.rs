//! Structured log records.
//!
//! One [`LogRecord`] is produced per log emission. It carries the severity,
//! the identity and props of the component that emitted it, the correlation
//! id of the top-level render, and either a free-form message or a metadata
//! object.

use crate::LogLevel;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use weft_types::RenderId;

/// Body of a [`LogRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum LogPayload {
    /// Free-form text.
    Message(String),
    /// Structured metadata object.
    Metadata(Value),
}

/// A single structured log emission.
///
/// # Example
///
/// ```
/// use weft_event::{LogLevel, LogPayload, LogRecord};
/// use weft_types::RenderId;
///
/// let record = LogRecord::message(LogLevel::Warn, "Completion", RenderId::new(), "retrying");
/// assert_eq!(record.level, LogLevel::Warn);
/// assert_eq!(record.payload, LogPayload::Message("retrying".into()));
/// assert!(record.props.is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Name of the originating component.
    pub component: String,
    /// Attributes of the originating component's element.
    #[serde(default)]
    pub props: Value,
    /// Correlation id of the top-level render.
    pub render_id: RenderId,
    /// Message or metadata.
    pub payload: LogPayload,
}

impl LogRecord {
    /// Creates a message record with no props.
    #[must_use]
    pub fn message(
        level: LogLevel,
        component: impl Into<String>,
        render_id: RenderId,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            component: component.into(),
            props: Value::Null,
            render_id,
            payload: LogPayload::Message(message.into()),
        }
    }

    /// Creates a metadata record with no props.
    #[must_use]
    pub fn metadata(
        level: LogLevel,
        component: impl Into<String>,
        render_id: RenderId,
        metadata: Value,
    ) -> Self {
        Self {
            level,
            component: component.into(),
            props: Value::Null,
            render_id,
            payload: LogPayload::Metadata(metadata),
        }
    }

    /// Attaches the originating element's props.
    #[must_use]
    pub fn with_props(mut self, props: Value) -> Self {
        self.props = props;
        self
    }

    /// Returns the message text, if this is a message record.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            LogPayload::Message(m) => Some(m),
            LogPayload::Metadata(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_record_has_no_text() {
        let record = LogRecord::metadata(
            LogLevel::Debug,
            "Search",
            RenderId::new(),
            json!({"hits": 3}),
        );
        assert_eq!(record.text(), None);
        assert_eq!(record.payload, LogPayload::Metadata(json!({"hits": 3})));
    }

    #[test]
    fn with_props_attaches_attributes() {
        let record = LogRecord::message(LogLevel::Info, "Chat", RenderId::new(), "hi")
            .with_props(json!({"model": "small"}));
        assert_eq!(record.props["model"], "small");
        assert_eq!(record.text(), Some("hi"));
    }

    #[test]
    fn payload_serializes_tagged() {
        let payload = LogPayload::Message("x".into());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, json!({"type": "message", "value": "x"}));
    }
}
