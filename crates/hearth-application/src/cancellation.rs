//! Per-conversation cancellation handles.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

/// Identifies one conversation of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub agent_id: String,
    pub conversation_id: String,
}

impl ConversationKey {
    pub fn new(agent_id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            conversation_id: conversation_id.into(),
        }
    }
}

struct Entry {
    generation: u64,
    token: CancellationToken,
}

/// Tracks the in-flight turn per conversation.
///
/// At most one turn runs per conversation: registering a new turn
/// cancels whatever was registered before (supersede). Entries carry a
/// generation number so a superseded turn's cleanup cannot evict its
/// successor's handle.
#[derive(Default)]
pub struct CancellationRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    next_generation: u64,
    entries: HashMap<ConversationKey, Entry>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new turn for the key, cancelling any existing one.
    ///
    /// Returns the generation to pass to [`release`](Self::release)
    /// and the token the turn must watch.
    pub fn register(&self, key: ConversationKey) -> (u64, CancellationToken) {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        inner.next_generation += 1;
        let generation = inner.next_generation;
        let token = CancellationToken::new();

        if let Some(previous) = inner.entries.insert(
            key,
            Entry {
                generation,
                token: token.clone(),
            },
        ) {
            previous.token.cancel();
        }
        (generation, token)
    }

    /// Cancels the in-flight turn for the key, if any.
    ///
    /// Returns whether a turn was actually cancelled.
    pub fn cancel(&self, key: &ConversationKey) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        match inner.entries.remove(key) {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Removes the entry for the key, but only when the generation
    /// still matches the caller's turn.
    pub fn release(&self, key: &ConversationKey, generation: u64) {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        if inner
            .entries
            .get(key)
            .is_some_and(|entry| entry.generation == generation)
        {
            inner.entries.remove(key);
        }
    }
}
