//! Engine configuration.
//!
//! ```toml
//! [logging]
//! level = "info"          # minimum level forwarded by TracingLogger
//! filter = "weft=info"    # default tracing filter, overridden by RUST_LOG
//!
//! [render]
//! dedupe_frames = true    # suppress identical consecutive frames
//! ```
//!
//! Use [`ConfigLoader`] to layer a file and environment variables over the
//! defaults, then [`RenderContext::from_config`](crate::RenderContext::from_config)
//! to build a root context.

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{LoggingConfig, RenderConfig, WeftConfig};
