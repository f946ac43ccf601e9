//! JSON-file chat repository with legacy-format migration.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use hearth_core::conversation::{
    derive_label, AgentChatData, ChatRepository, Conversation, Message, MessageRole,
};

use crate::paths::{validate_agent_id, HearthPaths};
use crate::storage::write_json;

/// Stores each agent's conversations in `agents/<id>/chats.json`.
///
/// Older installations stored a single flat message list per agent.
/// Loading such a file migrates it into one conversation and persists
/// the new shape immediately, so the legacy path is read at most once.
pub struct JsonChatRepository {
    paths: HearthPaths,
}

impl JsonChatRepository {
    pub fn new(paths: HearthPaths) -> Self {
        Self { paths }
    }

    fn migrate_legacy(agent_id: &str, messages: Vec<Message>) -> AgentChatData {
        let mut data = AgentChatData::default();
        if messages.is_empty() {
            return data;
        }

        let label = messages
            .iter()
            .find(|m| m.role == MessageRole::User)
            .map(|m| derive_label(&m.text))
            .unwrap_or_else(|| "Imported chat".to_string());
        let created_at = messages[0].timestamp;
        let last_active_at = messages[messages.len() - 1].timestamp;

        data.insert(Conversation {
            id: Uuid::new_v4().to_string(),
            agent_id: agent_id.to_string(),
            label,
            messages,
            created_at,
            last_active_at,
        });
        data
    }

    /// Moves an unreadable chats file aside so the data survives for
    /// manual inspection.
    async fn quarantine(&self, agent_id: &str) {
        let path = self.paths.chats_file(agent_id);
        let aside = path.with_extension("json.corrupt");
        if let Err(e) = fs::rename(&path, &aside).await {
            warn!(agent_id, "failed to move corrupt chats file aside: {e}");
        }
    }
}

#[async_trait]
impl ChatRepository for JsonChatRepository {
    async fn load(&self, agent_id: &str) -> Result<AgentChatData> {
        validate_agent_id(agent_id)?;
        let path = self.paths.chats_file(agent_id);
        if !path.exists() {
            return Ok(AgentChatData::default());
        }

        let raw = fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;

        if let Ok(data) = serde_json::from_str::<AgentChatData>(&raw) {
            return Ok(data);
        }

        if let Ok(messages) = serde_json::from_str::<Vec<Message>>(&raw) {
            info!(agent_id, count = messages.len(), "migrating legacy chat format");
            let data = Self::migrate_legacy(agent_id, messages);
            self.save(agent_id, &data).await?;
            return Ok(data);
        }

        warn!(agent_id, "chats file is unreadable, starting fresh");
        self.quarantine(agent_id).await;
        Ok(AgentChatData::default())
    }

    async fn save(&self, agent_id: &str, data: &AgentChatData) -> Result<()> {
        validate_agent_id(agent_id)?;
        write_json(&self.paths.chats_file(agent_id), data).await
    }
}
