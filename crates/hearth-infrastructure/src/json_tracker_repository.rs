//! JSON-file reflection tracker repository.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;

use hearth_core::reflection::{ReflectionTracker, ReflectionTrackerRepository};

use crate::paths::{validate_agent_id, HearthPaths};
use crate::storage::write_json;

/// Stores each agent's reflection tracker in
/// `agents/<id>/reflection.json`.
pub struct JsonReflectionTrackerRepository {
    paths: HearthPaths,
    default_interval: u32,
}

impl JsonReflectionTrackerRepository {
    pub fn new(paths: HearthPaths, default_interval: u32) -> Self {
        Self {
            paths,
            default_interval,
        }
    }
}

#[async_trait]
impl ReflectionTrackerRepository for JsonReflectionTrackerRepository {
    async fn load(&self, agent_id: &str) -> Result<ReflectionTracker> {
        validate_agent_id(agent_id)?;
        let path = self.paths.tracker_file(agent_id);
        if !path.exists() {
            return Ok(ReflectionTracker::with_interval(self.default_interval));
        }
        let raw = fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    async fn save(&self, agent_id: &str, tracker: &ReflectionTracker) -> Result<()> {
        validate_agent_id(agent_id)?;
        write_json(&self.paths.tracker_file(agent_id), tracker).await
    }
}
