//! Unified path layout for Hearth data.
//!
//! ```text
//! <root>/                          # ~/.hearth by default
//! ├── session_resume.json          # session ids, keyed per conversation
//! └── agents/
//!     └── <agent_id>/
//!         ├── chats.json           # conversation store
//!         ├── SOUL.md              # persona document
//!         ├── soul_history/        # day-bucketed persona snapshots
//!         │   └── YYYY-MM-DD.md
//!         ├── reflection.json      # reflection tracker
//!         └── logs/                # daily activity logs
//!             └── YYYY-MM-DD.md
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use hearth_core::HearthError;

/// Resolves every file the engine persists under a single root.
#[derive(Debug, Clone)]
pub struct HearthPaths {
    root: PathBuf,
}

impl HearthPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default root, `~/.config/hearth` on Linux and the platform
    /// equivalent elsewhere.
    pub fn default_location() -> Result<Self> {
        let config = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("cannot determine config directory"))?;
        Ok(Self::new(config.join("hearth")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resume_file(&self) -> PathBuf {
        self.root.join("session_resume.json")
    }

    pub fn agent_dir(&self, agent_id: &str) -> PathBuf {
        self.root.join("agents").join(agent_id)
    }

    pub fn chats_file(&self, agent_id: &str) -> PathBuf {
        self.agent_dir(agent_id).join("chats.json")
    }

    pub fn persona_file(&self, agent_id: &str) -> PathBuf {
        self.agent_dir(agent_id).join("SOUL.md")
    }

    pub fn persona_history_dir(&self, agent_id: &str) -> PathBuf {
        self.agent_dir(agent_id).join("soul_history")
    }

    pub fn tracker_file(&self, agent_id: &str) -> PathBuf {
        self.agent_dir(agent_id).join("reflection.json")
    }

    pub fn activity_log_dir(&self, agent_id: &str) -> PathBuf {
        self.agent_dir(agent_id).join("logs")
    }
}

/// Rejects agent ids that could escape the agents directory.
pub fn validate_agent_id(agent_id: &str) -> hearth_core::Result<()> {
    let safe = !agent_id.is_empty()
        && agent_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if safe {
        Ok(())
    } else {
        Err(HearthError::Security(format!(
            "invalid agent id: {agent_id:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_per_agent() {
        let paths = HearthPaths::new("/tmp/hearth-test");
        assert!(paths.chats_file("mai").ends_with("agents/mai/chats.json"));
        assert!(paths.persona_file("mai").ends_with("agents/mai/SOUL.md"));
        assert!(paths
            .persona_history_dir("mai")
            .ends_with("agents/mai/soul_history"));
        assert!(paths.resume_file().ends_with("session_resume.json"));
    }

    #[test]
    fn agent_id_validation() {
        assert!(validate_agent_id("mai").is_ok());
        assert!(validate_agent_id("agent_2-b").is_ok());
        assert!(validate_agent_id("").is_err());
        assert!(validate_agent_id("../escape").is_err());
        assert!(validate_agent_id("a/b").is_err());
        assert!(validate_agent_id("dot.dot").is_err());
    }
}
