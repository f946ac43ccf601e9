//! Abstraction over the external reasoning process.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Reply surfaced when a turn produced no usable text at all, for
/// example when the reasoning process could not be spawned.
pub const FALLBACK_FAILURE_TEXT: &str =
    "I ran into a problem and couldn't finish that thought. Please try again.";

/// One turn to execute against the reasoning process.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// The user's message for this turn
    pub prompt: String,
    /// Assembled system context, appended to the process's own system
    /// prompt
    pub system_context: Option<String>,
    /// Session id to resume, when the conversation has one
    pub resume_session_id: Option<String>,
    /// Hard deadline for the whole turn
    pub timeout: Duration,
}

/// Result of a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    /// Final reply text
    pub text: String,
    /// Session id the reasoning process assigned, when one was seen
    pub session_id: Option<String>,
}

/// Outcome of running a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The turn ran to completion (possibly with fallback text).
    Completed(TurnResult),
    /// The turn was cancelled before a reply could be produced.
    Cancelled,
}

/// Executes turns against an external reasoning process.
///
/// Implementations must honor `cancel` promptly: a cancelled turn
/// returns [`TurnOutcome::Cancelled`] and leaves no half-written
/// state behind.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn run_turn(&self, request: TurnRequest, cancel: CancellationToken)
        -> Result<TurnOutcome>;
}
