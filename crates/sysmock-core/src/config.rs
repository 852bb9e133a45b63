//! Expectation queue configuration.
//!
//! Validated at load time, with defaults that suit a single test scripting a
//! handful of calls.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MockError, Result};

/// Default maximum number of pending entries.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Default number of bytes per hex dump line in mismatch diagnostics.
pub const DEFAULT_HEXDUMP_WIDTH: usize = 16;

/// Configuration for an [`ExpectationQueue`](crate::ExpectationQueue).
///
/// ```rust
/// use sysmock_core::QueueConfig;
///
/// let config = QueueConfig::builder()
///     .capacity(64)
///     .strict_names(false)
///     .build();
/// assert_eq!(config.capacity(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of pending entries.
    #[serde(default = "default_capacity")]
    capacity: usize,

    /// Whether a pop must name the entry at the head of the queue.
    ///
    /// - `true`: a different name is an out-of-order call
    /// - `false`: names are only used in diagnostics
    #[serde(default = "default_strict_names")]
    strict_names: bool,

    /// Bytes per line in hex dumps.
    #[serde(default = "default_hexdump_width")]
    hexdump_width: usize,
}

const fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

const fn default_strict_names() -> bool {
    true
}

const fn default_hexdump_width() -> usize {
    DEFAULT_HEXDUMP_WIDTH
}

impl QueueConfig {
    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            strict_names: true,
            hexdump_width: DEFAULT_HEXDUMP_WIDTH,
        }
    }

    /// Creates a new configuration builder.
    #[must_use]
    pub const fn builder() -> QueueConfigBuilder {
        QueueConfigBuilder::new()
    }

    /// Maximum number of pending entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether pops must name the head entry.
    #[must_use]
    pub const fn strict_names(&self) -> bool {
        self.strict_names
    }

    /// Bytes per hex dump line.
    #[must_use]
    pub const fn hexdump_width(&self) -> usize {
        self.hexdump_width
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the capacity is zero or the hex dump width is
    /// outside `1..=64`.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(MockError::config("capacity must be at least 1"));
        }
        if !(1..=64).contains(&self.hexdump_width) {
            return Err(MockError::config("hexdump_width must be between 1 and 64"));
        }
        Ok(())
    }

    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    /// Returns an error if the text cannot be parsed or is invalid.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| MockError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| MockError::config(format!("failed to read config: {e}")))?;
        Self::from_toml(&content)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`QueueConfig`].
#[derive(Debug, Clone, Copy)]
pub struct QueueConfigBuilder {
    config: QueueConfig,
}

impl QueueConfigBuilder {
    /// Creates a builder with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            config: QueueConfig::new(),
        }
    }

    /// Maximum number of pending entries.
    ///
    /// Default: 4096
    #[must_use]
    pub const fn capacity(mut self, value: usize) -> Self {
        self.config.capacity = value;
        self
    }

    /// Whether pops must name the head entry.
    ///
    /// Default: `true`
    #[must_use]
    pub const fn strict_names(mut self, value: bool) -> Self {
        self.config.strict_names = value;
        self
    }

    /// Bytes per hex dump line.
    ///
    /// Default: 16
    #[must_use]
    pub const fn hexdump_width(mut self, value: usize) -> Self {
        self.config.hexdump_width = value;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub const fn build(self) -> QueueConfig {
        self.config
    }
}

impl Default for QueueConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = QueueConfig::default();
        assert_eq!(config.capacity(), DEFAULT_CAPACITY);
        assert!(config.strict_names());
        assert_eq!(config.hexdump_width(), 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = QueueConfig::builder()
            .capacity(8)
            .strict_names(false)
            .hexdump_width(8)
            .build();
        assert_eq!(config.capacity(), 8);
        assert!(!config.strict_names());
        assert_eq!(config.hexdump_width(), 8);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = QueueConfig::builder().capacity(0).build();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn test_hexdump_width_bounds() {
        assert!(QueueConfig::builder().hexdump_width(0).build().validate().is_err());
        assert!(QueueConfig::builder().hexdump_width(65).build().validate().is_err());
        assert!(QueueConfig::builder().hexdump_width(64).build().validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = QueueConfig::from_toml("capacity = 32\n").unwrap();
        assert_eq!(config.capacity(), 32);
        assert!(config.strict_names());
    }

    #[test]
    fn test_from_toml_invalid() {
        assert!(QueueConfig::from_toml("capacity = 0\n").is_err());
        assert!(QueueConfig::from_toml("capacity = \"many\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.toml");
        std::fs::write(&path, "strict_names = false\nhexdump_width = 8\n").unwrap();

        let config = QueueConfig::load(&path).unwrap();
        assert!(!config.strict_names());
        assert_eq!(config.hexdump_width(), 8);
    }

    #[test]
    fn test_load_missing_file() {
        let err = QueueConfig::load("/nonexistent/queue.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }
}
