//! Ambient context sources assembled into the system prompt.

use anyhow::Result;
use async_trait::async_trait;

/// Scaffold text written into freshly created context documents.
///
/// Sections whose content still equals one of these placeholders are
/// skipped during prompt assembly.
pub const PLACEHOLDERS: &[&str] = &[
    "(not yet written)",
    "(fill me in)",
    "TODO",
];

/// Whether a context document is still unmodified scaffold.
pub fn is_placeholder(content: &str) -> bool {
    let trimmed = content.trim();
    trimmed.is_empty() || PLACEHOLDERS.iter().any(|p| trimmed == *p)
}

/// Supplies the slow-changing context documents for an agent.
///
/// Each method returns `Ok(None)` when the document does not exist.
/// Assembly treats a placeholder or empty document the same as a
/// missing one.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Short self-description of the platform itself.
    async fn identity(&self, agent_id: &str) -> Result<Option<String>>;

    /// What the agent knows about its human.
    async fn human_profile(&self, agent_id: &str) -> Result<Option<String>>;

    /// Free-form notes scoped to the agent's workspace.
    async fn workspace_notes(&self, agent_id: &str) -> Result<Option<String>>;

    /// Long-lived curated memory.
    async fn curated_memory(&self, agent_id: &str) -> Result<Option<String>>;
}

/// Provider that supplies nothing. Useful in tests and for agents
/// running without a context directory.
pub struct NullContextProvider;

#[async_trait]
impl ContextProvider for NullContextProvider {
    async fn identity(&self, _agent_id: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn human_profile(&self, _agent_id: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn workspace_notes(&self, _agent_id: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn curated_memory(&self, _agent_id: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Day-bucketed activity log, read back for prompts and reflection.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Tail of today's log, at most `max_chars` characters, or `None`
    /// when nothing was logged today.
    async fn today_excerpt(&self, agent_id: &str, max_chars: usize) -> Result<Option<String>>;

    /// Full logs for the last `days` calendar days, oldest first, as
    /// `(date, content)` pairs. Days without a log are omitted.
    async fn recent_days(&self, agent_id: &str, days: u32) -> Result<Vec<(String, String)>>;

    /// Appends a line to today's log, creating it if needed.
    async fn append(&self, agent_id: &str, line: &str) -> Result<()>;
}
