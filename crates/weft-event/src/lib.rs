//! Event and log types for weft.
//!
//! This crate holds the serializable data that the render engine emits
//! outward. It has no behavior of its own.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SDK Layer                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  weft-types  : ID types, ErrorCode                           │
//! │  weft-event  : LogRecord, RenderEvent           ◄── HERE     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Message Types
//!
//! | Type | Emitted by | Consumed by |
//! |------|------------|-------------|
//! | [`LogRecord`] | Components and the engine | Logger sinks |
//! | [`RenderEvent`] | Live elements | Event listeners |

mod level;
mod record;
mod render;

pub use level::{LogLevel, ParseLevelError};
pub use record::{LogPayload, LogRecord};
pub use render::{EventKind, ListenerId, RenderEvent};
