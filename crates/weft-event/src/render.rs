//! Events fired by live elements.
//!
//! Every live element owns a listener registry. Events describe what
//! happened to the element itself or to one of its descendants:
//!
//! ```text
//! leaf stream pulls "ab"
//!     │ ChildAdvanced (source = leaf)
//!     ▼
//! parent fragment  ── ChildAdvanced (source = leaf)
//!     │
//!     ▼
//! root             ── ChildAdvanced (source = leaf)
//! ```
//!
//! Terminal events (`Completed`, `Aborted`, `Failed`) fire once per element,
//! when its whole subtree leaves the pending state.

use serde::{Deserialize, Serialize};
use weft_types::LiveId;

/// Kind of a [`RenderEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A direct child settled, at the given source-order index.
    ChildArrived {
        /// Source-order position of the child.
        index: usize,
    },
    /// The element or one of its descendants produced new content.
    ChildAdvanced,
    /// The element and all its descendants finished.
    Completed,
    /// The element or a descendant was force-completed by an abort signal.
    Aborted,
    /// The element or an unrecovered descendant failed.
    Failed {
        /// Display form of the error.
        message: String,
    },
}

impl EventKind {
    /// Returns `true` for `Completed`, `Aborted` and `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Failed { .. })
    }
}

/// Handle returned when registering a listener, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// An event delivered to live element listeners.
///
/// # Example
///
/// ```
/// use weft_event::{EventKind, RenderEvent};
/// use weft_types::LiveId;
///
/// let event = RenderEvent::new(LiveId::new(), EventKind::Completed);
/// assert!(event.kind.is_terminal());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderEvent {
    /// Element where the change originated.
    pub source: LiveId,
    /// What happened.
    pub kind: EventKind,
}

impl RenderEvent {
    /// Creates a new event.
    #[must_use]
    pub fn new(source: LiveId, kind: EventKind) -> Self {
        Self { source, kind }
    }
}
