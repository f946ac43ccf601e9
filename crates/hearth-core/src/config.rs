//! Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HearthError, Result};
use crate::reflection::DEFAULT_REFLECTION_INTERVAL;

/// Default seconds before a turn is abandoned.
pub const DEFAULT_TURN_TIMEOUT_SECS: u64 = 300;

/// Engine-wide configuration, loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Binary name or path of the external reasoning process
    pub reasoner_binary: String,
    /// Hard per-turn deadline in seconds
    pub turn_timeout_secs: u64,
    /// Tools the reasoning process may use during a turn
    pub allowed_tools: Vec<String>,
    /// Completed sessions between reflections
    pub reflection_interval: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reasoner_binary: "claude".to_string(),
            turn_timeout_secs: DEFAULT_TURN_TIMEOUT_SECS,
            allowed_tools: vec!["Read".to_string(), "Write".to_string(), "Bash".to_string()],
            reflection_interval: DEFAULT_REFLECTION_INTERVAL,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults; a present but unparsable
    /// file is an error rather than a silent fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| HearthError::Serialization { message: format!("{path:?}: {e}") })
    }

    /// Turn timeout as a [`std::time::Duration`].
    pub fn turn_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.turn_timeout_secs)
    }
}
