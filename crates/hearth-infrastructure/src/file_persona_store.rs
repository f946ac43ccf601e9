//! File-backed persona store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;

use hearth_core::persona::{PersonaStore, VersionSummary};

use crate::paths::{validate_agent_id, HearthPaths};
use crate::storage::write_atomic;
use crate::version_history;

/// Stores each agent's persona document at `agents/<id>/SOUL.md` with
/// snapshots under `agents/<id>/soul_history/`.
pub struct FilePersonaStore {
    paths: HearthPaths,
}

impl FilePersonaStore {
    pub fn new(paths: HearthPaths) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl PersonaStore for FilePersonaStore {
    async fn load(&self, agent_id: &str) -> Result<Option<String>> {
        validate_agent_id(agent_id)?;
        let path = self.paths.persona_file(agent_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    async fn save(&self, agent_id: &str, content: &str) -> Result<()> {
        validate_agent_id(agent_id)?;
        write_atomic(&self.paths.persona_file(agent_id), content).await
    }

    async fn snapshot(&self, agent_id: &str) -> Result<()> {
        validate_agent_id(agent_id)?;
        version_history::save_version(
            &self.paths.persona_file(agent_id),
            &self.paths.persona_history_dir(agent_id),
        )
        .await?;
        Ok(())
    }

    async fn history(&self, agent_id: &str, limit: usize) -> Result<Vec<VersionSummary>> {
        validate_agent_id(agent_id)?;
        version_history::get_history(&self.paths.persona_history_dir(agent_id), limit).await
    }

    async fn history_entry(&self, agent_id: &str, date: &str) -> Result<Option<String>> {
        validate_agent_id(agent_id)?;
        version_history::get_content(&self.paths.persona_history_dir(agent_id), date).await
    }
}
