//! Persona store trait.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One entry in a document's version history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSummary {
    /// Day key (`YYYY-MM-DD`) of the snapshot
    pub date: String,
    /// First non-blank line of the snapshot
    pub summary: String,
}

/// An abstract store for persona documents and their version history.
///
/// The engine snapshots a persona document immediately before every
/// reflection overwrite; snapshots are day-bucketed (at most one per
/// calendar day, see the infrastructure implementation).
#[async_trait]
pub trait PersonaStore: Send + Sync {
    /// Loads the persona document, or `None` if the agent has none yet.
    async fn load(&self, agent_id: &str) -> Result<Option<String>>;

    /// Overwrites the persona document.
    async fn save(&self, agent_id: &str, content: &str) -> Result<()>;

    /// Takes a day-bucketed snapshot of the current document. No-op if
    /// the document does not exist.
    async fn snapshot(&self, agent_id: &str) -> Result<()>;

    /// Lists snapshot summaries, newest first, up to `limit`.
    async fn history(&self, agent_id: &str, limit: usize) -> Result<Vec<VersionSummary>>;

    /// Returns the full snapshot for a day key, or `None` if absent.
    ///
    /// Implementations must reject date keys that are not strict
    /// `YYYY-MM-DD` values instead of looking them up.
    async fn history_entry(&self, agent_id: &str, date: &str) -> Result<Option<String>>;
}
