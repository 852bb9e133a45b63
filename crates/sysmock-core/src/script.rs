//! Expectation scripts loaded from TOML.
//!
//! ```toml
//! [[expect]]
//! name = "socket(domain)"
//! payload = { i32 = 2 }
//!
//! [[expect]]
//! name = "mount(data)"
//! payload = "absent"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MockError, Result};
use crate::payload::Payload;

/// One scripted entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEntry {
    /// Entry name.
    pub name: String,
    /// Expected value.
    pub payload: Payload,
}

/// Ordered list of expectations that can be stored alongside a test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default, rename = "expect")]
    entries: Vec<ScriptEntry>,
}

impl Script {
    /// Creates an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    #[must_use]
    pub fn expect(mut self, name: impl Into<String>, payload: impl Into<Payload>) -> Self {
        self.entries.push(ScriptEntry {
            name: name.into(),
            payload: payload.into(),
        });
        self
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the script has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in order.
    #[must_use]
    pub fn entries(&self) -> &[ScriptEntry] {
        &self.entries
    }

    /// Consumes the script.
    #[must_use]
    pub fn into_entries(self) -> Vec<ScriptEntry> {
        self.entries
    }

    /// Parses a script. Entry names must be non-empty.
    ///
    /// # Errors
    /// Returns [`MockError::Script`] on malformed input.
    pub fn from_toml(text: &str) -> Result<Self> {
        let script: Self = toml::from_str(text)
            .map_err(|e| MockError::script(format!("failed to parse script: {e}")))?;
        if let Some(index) = script.entries.iter().position(|e| e.name.is_empty()) {
            return Err(MockError::script(format!("entry {index} has an empty name")));
        }
        Ok(script)
    }

    /// Loads a script from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Renders the script as TOML.
    ///
    /// # Errors
    /// Returns [`MockError::Script`] if a payload cannot be represented in
    /// TOML (for example a `u64` above `i64::MAX`).
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| MockError::script(format!("failed to render script: {e}")))
    }
}
