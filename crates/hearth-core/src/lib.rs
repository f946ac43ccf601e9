//! Core domain layer of the Hearth agent interaction engine.
//!
//! This crate holds the domain model and the traits the outer layers
//! implement: conversations and their persistence, persona documents
//! with a locked section, reflection scheduling, session resume, and
//! the reasoning-process abstraction. It has no I/O of its own beyond
//! configuration loading.

pub mod config;
pub mod context;
pub mod conversation;
pub mod datekey;
pub mod error;
pub mod persona;
pub mod reasoner;
pub mod reflection;
pub mod resume;

pub use config::EngineConfig;
pub use conversation::{
    derive_label, AgentChatData, ChatRepository, Conversation, ConversationStore, Message,
    MessageRole, DEFAULT_LABEL,
};
pub use error::{HearthError, Result};
pub use persona::{
    extract_revision, locked_section, restore_locked_section, PersonaStore, VersionSummary,
    LOCKED_HEADING,
};
pub use reasoner::{
    Reasoner, TurnOutcome, TurnRequest, TurnResult, FALLBACK_FAILURE_TEXT,
};
pub use reflection::{ReflectionTracker, ReflectionTrackerRepository};
pub use resume::SessionResumeRepository;
