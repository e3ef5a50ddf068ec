//! Render errors.
//!
//! All render errors implement [`ErrorCode`] for unified handling.
//!
//! # Error Code Convention
//!
//! All render errors use the `RENDER_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`Component`](RenderError::Component) | `RENDER_COMPONENT_FAILED` | Yes |
//! | [`InvalidRenderable`](RenderError::InvalidRenderable) | `RENDER_INVALID_RENDERABLE` | No |
//! | [`ForkClosed`](RenderError::ForkClosed) | `RENDER_FORK_CLOSED` | No |
//! | [`Internal`](RenderError::Internal) | `RENDER_INTERNAL` | No |
//!
//! Abort is **not** an error. An aborted render completes normally with
//! [`Status::Aborted`](crate::Status::Aborted).
//!
//! # Example
//!
//! ```
//! use weft_render::RenderError;
//! use weft_types::ErrorCode;
//!
//! let err = RenderError::component("Completion", "backend timed out");
//! assert_eq!(err.code(), "RENDER_COMPONENT_FAILED");
//! assert!(err.is_recoverable());
//! assert_eq!(err.to_string(), "component 'Completion' failed: backend timed out");
//! ```

use thiserror::Error;
use weft_types::{ErrorCode, ForkId};

/// Render layer error.
///
/// Errors are `Clone` because one failure is observed by every consumer
/// of the failed subtree (ancestors, memo subscribers, frame streams).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A component body failed, synchronously or asynchronously.
    #[error("component '{component}' failed: {message}")]
    Component {
        /// Name of the failing component.
        component: String,
        /// Failure description.
        message: String,
    },

    /// A component returned a value outside the renderable contract.
    #[error("component '{component}' returned an invalid renderable: {found}")]
    InvalidRenderable {
        /// Name of the offending component.
        component: String,
        /// Description of what was returned.
        found: String,
    },

    /// A payload was sent to a fork after it was closed.
    #[error("fork {0} is already closed")]
    ForkClosed(ForkId),

    /// Engine invariant violation or missing runtime.
    #[error("internal render error: {0}")]
    Internal(String),
}

impl RenderError {
    /// Creates a component failure.
    pub fn component(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

impl ErrorCode for RenderError {
    fn code(&self) -> &'static str {
        match self {
            Self::Component { .. } => "RENDER_COMPONENT_FAILED",
            Self::InvalidRenderable { .. } => "RENDER_INVALID_RENDERABLE",
            Self::ForkClosed(_) => "RENDER_FORK_CLOSED",
            Self::Internal(_) => "RENDER_INTERNAL",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Component { .. })
    }
}
