//! Application layer of the Hearth agent interaction engine.
//!
//! Ties the domain layer, the file-backed repositories, and the
//! reasoning-process boundary together into the [`InteractionEngine`]:
//! message handling with durable ordering, per-conversation
//! cancellation with supersede semantics, context assembly, and the
//! scheduled self-reflection cycle.

pub mod cancellation;
pub mod context_assembly;
pub mod engine;
pub mod events;
pub mod reflection;

pub use cancellation::{CancellationRegistry, ConversationKey};
pub use context_assembly::assemble_context;
pub use engine::{HandleOutcome, InteractionEngine};
pub use events::EngineEvent;
pub use reflection::ReflectionReport;
