//! Reflection tracker persistence trait.

use anyhow::Result;
use async_trait::async_trait;

use super::model::ReflectionTracker;

/// Persistence for per-agent reflection trackers.
#[async_trait]
pub trait ReflectionTrackerRepository: Send + Sync {
    /// Loads the tracker for an agent, or a default one when the agent
    /// has never reflected.
    async fn load(&self, agent_id: &str) -> Result<ReflectionTracker>;

    /// Persists the tracker.
    async fn save(&self, agent_id: &str, tracker: &ReflectionTracker) -> Result<()>;
}
