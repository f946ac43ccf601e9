//! Reasoning-process integration: NDJSON stream parsing and the
//! Claude CLI subprocess backend.

pub mod claude_cli;
pub mod stream;

pub use claude_cli::ClaudeCliReasoner;
pub use stream::{parse_line, StreamEvent, TurnAccumulator};
