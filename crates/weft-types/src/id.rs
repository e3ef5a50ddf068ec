//! Identifier types for weft.
//!
//! All identifiers are UUID-based so that log records and events can be
//! correlated across processes without coordination.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new identifier with a random UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub fn uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Correlation identifier for one top-level render.
    ///
    /// Every log record emitted while evaluating a tree carries the
    /// [`RenderId`] of the top-level `render` call that started it, so a
    /// sink can group interleaved output from concurrent renders.
    ///
    /// # Example
    ///
    /// ```
    /// use weft_types::RenderId;
    ///
    /// let a = RenderId::new();
    /// let b = RenderId::new();
    /// assert_ne!(a, b);
    /// ```
    RenderId
}

uuid_id! {
    /// Identity of a constructed element.
    ///
    /// Two structurally equal elements built by separate calls have
    /// different ids; clones of one element share its id.
    ElementId
}

uuid_id! {
    /// Identity of one live evaluation (a rendered node under a context).
    LiveId
}

uuid_id! {
    /// Opaque tag of one logical stream inside a multiplexed evaluation.
    ForkId
}
