//! Configuration loader with layered merging.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Config file (optional, via [`ConfigLoader::with_file`])
//! 3. Environment variables (`WEFT_*`)
//!
//! Each layer overrides the previous.
//!
//! # Environment Variables
//!
//! | Variable | Field | Format |
//! |----------|-------|--------|
//! | `WEFT_LOG_LEVEL` | `logging.level` | `trace`, `debug`, `info`, `warn`, `error` |
//! | `WEFT_LOG_FILTER` | `logging.filter` | `tracing` filter directive |
//! | `WEFT_DEDUPE_FRAMES` | `render.dedupe_frames` | `true/false/1/0/yes/no/on/off` |

use super::{ConfigError, WeftConfig};
use std::path::{Path, PathBuf};
use tracing::debug;
use weft_event::LogLevel;

/// Helper macro for parsing boolean environment variables.
macro_rules! parse_env_bool {
    ($field:expr, $var:literal) => {
        if let Ok(val) = std::env::var($var) {
            $field = parse_bool(&val)
                .ok_or_else(|| ConfigError::invalid_env_var($var, "expected bool"))?;
        }
    };
}

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```
/// use weft_render::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .skip_env_vars() // deterministic
///     .load()
///     .unwrap();
/// assert!(config.render.dedupe_frames);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Config file path. Missing files are ignored.
    file: Option<PathBuf>,

    /// Skip environment variable loading.
    skip_env: bool,
}

impl ConfigLoader {
    /// Creates a loader that reads only defaults and environment variables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a TOML config file layer.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Skips environment variable loading.
    ///
    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Loads and merges configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file exists but cannot be
    /// read or parsed, or an environment variable holds an invalid value.
    pub fn load(&self) -> Result<WeftConfig, ConfigError> {
        let mut config = match &self.file {
            Some(path) => match Self::load_file(path)? {
                Some(config) => {
                    debug!(path = %path.display(), "Loaded config file");
                    config
                }
                None => {
                    debug!(path = %path.display(), "Config file not found, using defaults");
                    WeftConfig::default()
                }
            },
            None => WeftConfig::default(),
        };

        if !self.skip_env {
            Self::apply_env_vars(&mut config)?;
        }

        Ok(config)
    }

    /// Loads a config file, returning None if it doesn't exist.
    fn load_file(path: &Path) -> Result<Option<WeftConfig>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

        let config =
            WeftConfig::from_toml(&content).map_err(|e| ConfigError::parse_toml(path, e))?;

        Ok(Some(config))
    }

    /// Applies environment variable overrides.
    fn apply_env_vars(config: &mut WeftConfig) -> Result<(), ConfigError> {
        parse_env_bool!(config.render.dedupe_frames, "WEFT_DEDUPE_FRAMES");

        if let Ok(val) = std::env::var("WEFT_LOG_LEVEL") {
            config.logging.level = val
                .parse::<LogLevel>()
                .map_err(|e| ConfigError::invalid_env_var("WEFT_LOG_LEVEL", e.to_string()))?;
        }

        if let Ok(val) = std::env::var("WEFT_LOG_FILTER") {
            config.logging.filter = val;
        }

        Ok(())
    }
}

/// Parses a boolean from string.
///
/// Accepts: "true", "false", "1", "0", "yes", "no", "on", "off" (case-insensitive).
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_without_file() {
        let config = ConfigLoader::new().skip_env_vars().load().unwrap();
        assert_eq!(config, WeftConfig::default());
    }

    #[test]
    fn missing_file_is_ignored() {
        let config = ConfigLoader::new()
            .with_file("/nonexistent/weft.toml")
            .skip_env_vars()
            .load()
            .unwrap();
        assert_eq!(config, WeftConfig::default());
    }

    #[test]
    fn file_overrides_defaults() {
        let file = write_config(
            r#"
[logging]
level = "debug"

[render]
dedupe_frames = false
"#,
        );
        let config = ConfigLoader::new()
            .with_file(file.path())
            .skip_env_vars()
            .load()
            .unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.filter, "weft=info");
        assert!(!config.render.dedupe_frames);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let file = write_config("[render\ndedupe_frames = ");
        let err = ConfigLoader::new()
            .with_file(file.path())
            .skip_env_vars()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn parse_bool_values() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("false"), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
