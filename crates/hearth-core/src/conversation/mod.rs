//! Conversation lifecycle: domain model, label derivation, repository
//! trait, and the injected store that ties them together.

pub mod label;
pub mod model;
pub mod repository;
pub mod store;

pub use label::derive_label;
pub use model::{AgentChatData, Conversation, Message, MessageRole, DEFAULT_LABEL};
pub use repository::ChatRepository;
pub use store::ConversationStore;
