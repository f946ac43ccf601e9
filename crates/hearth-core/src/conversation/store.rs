use super::model::{AgentChatData, Conversation, Message};
use super::repository::ChatRepository;
use crate::error::{HearthError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Manages per-agent conversations and their persisted history.
///
/// `ConversationStore` is an explicit store object constructed once and
/// injected into the engine; there is no ambient module-level cache.
/// It keeps loaded chat data in memory per agent and writes the full
/// structure back through the injected [`ChatRepository`] after each
/// mutation. The internal write lock serializes writers within this
/// process; on-disk semantics remain read-modify-write,
/// last-writer-wins.
pub struct ConversationStore {
    /// In-memory chat data keyed by agent id
    cache: RwLock<HashMap<String, AgentChatData>>,
    /// Persistent storage backend
    repository: Arc<dyn ChatRepository>,
}

impl ConversationStore {
    /// Creates a new `ConversationStore` with a repository backend.
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            repository,
        }
    }

    /// Ensures the agent's chat data is loaded, running legacy
    /// migration in the repository on first access.
    async fn ensure_loaded(
        &self,
        cache: &mut HashMap<String, AgentChatData>,
        agent_id: &str,
    ) -> Result<()> {
        if !cache.contains_key(agent_id) {
            let data = self.repository.load(agent_id).await?;
            cache.insert(agent_id.to_string(), data);
        }
        Ok(())
    }

    /// Creates a new empty conversation, inserted at the front of the
    /// recency index, and persists the change.
    pub async fn create_conversation(
        &self,
        agent_id: &str,
        label: Option<String>,
    ) -> Result<Conversation> {
        let mut cache = self.cache.write().await;
        self.ensure_loaded(&mut cache, agent_id).await?;

        let conversation = Conversation::new(agent_id, label);
        let data = cache.get_mut(agent_id).expect("loaded above");
        data.insert(conversation.clone());

        self.repository.save(agent_id, data).await?;
        Ok(conversation)
    }

    /// Appends a message to a conversation and persists the change.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::NotFound`] if the conversation id is
    /// unknown for this agent; the store is left untouched.
    pub async fn append_message(
        &self,
        agent_id: &str,
        conversation_id: &str,
        message: Message,
    ) -> Result<()> {
        let mut cache = self.cache.write().await;
        self.ensure_loaded(&mut cache, agent_id).await?;

        let data = cache.get_mut(agent_id).expect("loaded above");
        if !data.append_message(conversation_id, message) {
            return Err(HearthError::not_found("conversation", conversation_id));
        }

        self.repository.save(agent_id, data).await?;
        Ok(())
    }

    /// Returns a conversation by id, if present.
    pub async fn get_conversation(
        &self,
        agent_id: &str,
        conversation_id: &str,
    ) -> Result<Option<Conversation>> {
        let mut cache = self.cache.write().await;
        self.ensure_loaded(&mut cache, agent_id).await?;
        Ok(cache[agent_id].conversations.get(conversation_id).cloned())
    }

    /// Lists the agent's conversations, most recent first.
    pub async fn list_conversations(&self, agent_id: &str) -> Result<Vec<Conversation>> {
        let mut cache = self.cache.write().await;
        self.ensure_loaded(&mut cache, agent_id).await?;
        Ok(cache[agent_id]
            .ordered()
            .into_iter()
            .cloned()
            .collect())
    }

    /// Sets an explicit label on a conversation.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::NotFound`] if the conversation id is
    /// unknown for this agent.
    pub async fn set_label(
        &self,
        agent_id: &str,
        conversation_id: &str,
        label: String,
    ) -> Result<()> {
        let mut cache = self.cache.write().await;
        self.ensure_loaded(&mut cache, agent_id).await?;

        let data = cache.get_mut(agent_id).expect("loaded above");
        let Some(conversation) = data.conversations.get_mut(conversation_id) else {
            return Err(HearthError::not_found("conversation", conversation_id));
        };
        conversation.label = label;

        self.repository.save(agent_id, data).await?;
        Ok(())
    }

    /// Deletes a conversation.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::NotFound`] if the conversation id is
    /// unknown for this agent.
    pub async fn delete_conversation(&self, agent_id: &str, conversation_id: &str) -> Result<()> {
        let mut cache = self.cache.write().await;
        self.ensure_loaded(&mut cache, agent_id).await?;

        let data = cache.get_mut(agent_id).expect("loaded above");
        if data.remove(conversation_id).is_none() {
            return Err(HearthError::not_found("conversation", conversation_id));
        }

        self.repository.save(agent_id, data).await?;
        Ok(())
    }

    /// Deletes all conversations for an agent.
    pub async fn clear_all(&self, agent_id: &str) -> Result<()> {
        let mut cache = self.cache.write().await;
        let data = AgentChatData::default();
        self.repository.save(agent_id, &data).await?;
        cache.insert(agent_id.to_string(), data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::model::{MessageRole, DEFAULT_LABEL};
    use std::sync::Mutex;

    // Mock ChatRepository for testing
    struct MockChatRepository {
        stored: Mutex<HashMap<String, AgentChatData>>,
    }

    impl MockChatRepository {
        fn new() -> Self {
            Self {
                stored: Mutex::new(HashMap::new()),
            }
        }

        fn saved(&self, agent_id: &str) -> Option<AgentChatData> {
            self.stored.lock().unwrap().get(agent_id).cloned()
        }
    }

    #[async_trait::async_trait]
    impl ChatRepository for MockChatRepository {
        async fn load(&self, agent_id: &str) -> anyhow::Result<AgentChatData> {
            Ok(self
                .stored
                .lock()
                .unwrap()
                .get(agent_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn save(&self, agent_id: &str, data: &AgentChatData) -> anyhow::Result<()> {
            self.stored
                .lock()
                .unwrap()
                .insert(agent_id.to_string(), data.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn create_conversation_uses_default_label() {
        let repository = Arc::new(MockChatRepository::new());
        let store = ConversationStore::new(repository.clone());

        let conversation = store.create_conversation("mai", None).await.unwrap();
        assert_eq!(conversation.label, DEFAULT_LABEL);
        assert!(conversation.messages.is_empty());

        let saved = repository.saved("mai").unwrap();
        assert_eq!(saved.order, vec![conversation.id]);
    }

    #[tokio::test]
    async fn append_message_persists_and_reorders() {
        let repository = Arc::new(MockChatRepository::new());
        let store = ConversationStore::new(repository.clone());

        let older = store.create_conversation("mai", None).await.unwrap();
        let newer = store.create_conversation("mai", None).await.unwrap();

        store
            .append_message("mai", &older.id, Message::user("mai", "wake me at seven"))
            .await
            .unwrap();

        let listed = store.list_conversations("mai").await.unwrap();
        assert_eq!(listed[0].id, older.id);
        assert_eq!(listed[0].label, "wake me at seven");
        assert_eq!(listed[1].id, newer.id);

        let saved = repository.saved("mai").unwrap();
        assert_eq!(saved.conversations[&older.id].messages.len(), 1);
        assert_eq!(
            saved.conversations[&older.id].messages[0].role,
            MessageRole::User
        );
    }

    #[tokio::test]
    async fn append_to_unknown_conversation_is_not_found() {
        let repository = Arc::new(MockChatRepository::new());
        let store = ConversationStore::new(repository.clone());
        store.create_conversation("mai", None).await.unwrap();

        let err = store
            .append_message("mai", "missing", Message::user("mai", "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, HearthError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_and_clear_all() {
        let repository = Arc::new(MockChatRepository::new());
        let store = ConversationStore::new(repository.clone());

        let a = store.create_conversation("mai", None).await.unwrap();
        let _b = store.create_conversation("mai", None).await.unwrap();

        store.delete_conversation("mai", &a.id).await.unwrap();
        assert_eq!(store.list_conversations("mai").await.unwrap().len(), 1);

        let err = store.delete_conversation("mai", &a.id).await.unwrap_err();
        assert!(matches!(err, HearthError::NotFound { .. }));

        store.clear_all("mai").await.unwrap();
        assert!(store.list_conversations("mai").await.unwrap().is_empty());
        assert!(repository.saved("mai").unwrap().conversations.is_empty());
    }

    #[tokio::test]
    async fn first_access_loads_from_repository() {
        let repository = Arc::new(MockChatRepository::new());
        {
            let mut data = AgentChatData::default();
            data.insert(Conversation::new("mai", Some("Restored".to_string())));
            repository
                .stored
                .lock()
                .unwrap()
                .insert("mai".to_string(), data);
        }

        let store = ConversationStore::new(repository);
        let listed = store.list_conversations("mai").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].label, "Restored");
    }
}
