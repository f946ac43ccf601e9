//! Engine progress events.
//!
//! Events are advisory: they let a frontend show progress, but every
//! durable effect has already happened by the time the matching event
//! is emitted. Nothing in the engine depends on anyone listening.

use serde::Serialize;

/// Broadcast events emitted by the interaction engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// The user message has been persisted.
    MessageAccepted {
        agent_id: String,
        conversation_id: String,
        message_id: String,
    },
    /// A turn is running for the conversation.
    Working {
        agent_id: String,
        conversation_id: String,
    },
    /// The assistant reply has been persisted.
    ReplyReady {
        agent_id: String,
        conversation_id: String,
        message_id: String,
    },
    /// The in-flight turn was cancelled; no reply will arrive.
    TurnCancelled {
        agent_id: String,
        conversation_id: String,
    },
    /// A reflection cycle ran and its outcome was persisted.
    ReflectionApplied {
        agent_id: String,
        corrected_locked_section: bool,
    },
}
