//! Configuration types.

use serde::{Deserialize, Serialize};
use weft_event::LogLevel;

/// Root configuration.
///
/// Every section falls back to its defaults, so a partial TOML file is
/// valid.
///
/// # Example
///
/// ```
/// use weft_render::config::WeftConfig;
///
/// let config = WeftConfig::from_toml("[render]\ndedupe_frames = false").unwrap();
/// assert!(!config.render.dedupe_frames);
/// assert_eq!(config.logging.filter, "weft=info");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeftConfig {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Render engine settings.
    pub render: RenderConfig,
}

impl WeftConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for malformed input or unknown values.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level forwarded by the default logger sink.
    pub level: LogLevel,
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            filter: "weft=info".to_string(),
        }
    }
}

/// `[render]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Suppress identical consecutive frames.
    pub dedupe_frames: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dedupe_frames: true,
        }
    }
}
