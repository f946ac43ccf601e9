//! Chat repository trait.
//!
//! Defines the interface for per-agent conversation persistence.

use super::model::AgentChatData;
use anyhow::Result;
use async_trait::async_trait;

/// An abstract repository for per-agent chat data.
///
/// This trait decouples the conversation store from the specific
/// storage mechanism (e.g. a JSON file per agent, a database).
///
/// # Implementation Notes
///
/// Implementations are responsible for legacy-format migration and for
/// recovering from unreadable persisted state: `load` must return an
/// empty structure rather than fail when the backing document is
/// missing or corrupt.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Loads the chat data for an agent, migrating legacy formats if
    /// necessary.
    async fn load(&self, agent_id: &str) -> Result<AgentChatData>;

    /// Persists the full chat data for an agent (read-modify-write,
    /// last-writer-wins).
    async fn save(&self, agent_id: &str, data: &AgentChatData) -> Result<()>;
}
