//! Session resume bookkeeping.
//!
//! The external reasoning process assigns each streamed turn a session
//! id. Persisting the most recent id per conversation lets the next
//! turn resume with full provider-side context instead of starting
//! cold.

use anyhow::Result;
use async_trait::async_trait;

/// Persistence for the latest reasoning-process session id per
/// conversation.
#[async_trait]
pub trait SessionResumeRepository: Send + Sync {
    /// Returns the stored session id for a conversation, if any.
    async fn get(&self, agent_id: &str, conversation_id: &str) -> Result<Option<String>>;

    /// Stores the session id for a conversation, replacing any
    /// previous value.
    async fn set(&self, agent_id: &str, conversation_id: &str, session_id: &str) -> Result<()>;
}
