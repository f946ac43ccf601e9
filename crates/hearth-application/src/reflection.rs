//! The self-reflection cycle.
//!
//! A reflection runs one reasoner turn over the persona document and
//! the last week of activity logs, then applies the proposed revision
//! with the locked section restored byte-for-byte. The previous
//! document is snapshotted before any overwrite.

use anyhow::Result;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use hearth_core::persona::{
    extract_revision, restore_locked_section, VersionSummary, LOCKED_HEADING, REVISION_CLOSE_TAG,
    REVISION_OPEN_TAG,
};
use hearth_core::reasoner::{TurnOutcome, TurnRequest};

use crate::engine::InteractionEngine;
use crate::events::EngineEvent;

/// How far back the reflection prompt reaches into the activity logs.
const REFLECTION_LOG_DAYS: u32 = 7;

/// Outcome of one reflection cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionReport {
    /// Whether the persona document was overwritten
    pub applied: bool,
    /// Whether the proposal tampered with the locked section and had
    /// to be corrected
    pub corrected_locked_section: bool,
    /// Human-readable detail when nothing was applied
    pub note: Option<String>,
}

impl ReflectionReport {
    fn skipped(note: &str) -> Self {
        Self {
            applied: false,
            corrected_locked_section: false,
            note: Some(note.to_string()),
        }
    }
}

fn build_reflection_prompt(persona: &str, logs: &[(String, String)]) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are performing a scheduled self-reflection. Review how you have \
         been acting lately and revise your persona document accordingly.\n\n",
    );
    prompt.push_str("# Current persona document\n\n");
    prompt.push_str(persona.trim_end());
    prompt.push_str("\n\n# Recent activity\n\n");
    if logs.is_empty() {
        prompt.push_str("(no activity recorded)\n");
    }
    for (date, content) in logs {
        prompt.push_str(&format!("## {date}\n\n{}\n\n", content.trim_end()));
    }
    prompt.push_str(&format!(
        "# Instructions\n\n\
         Rewrite the persona document, keeping what still holds and adjusting \
         what the recent activity contradicts. Keep it concise. The `{LOCKED_HEADING}` \
         section must be carried over exactly as it is, without any change. \
         Output the complete revised document wrapped in {REVISION_OPEN_TAG} and \
         {REVISION_CLOSE_TAG} tags and nothing else.",
    ));
    prompt
}

impl InteractionEngine {
    /// Runs one reflection cycle for an agent.
    ///
    /// Without `force`, the cycle only runs when the tracker says it is
    /// due. A completed reasoner turn resets the tracker whether or not
    /// the document changed; a proposal that tampers with the locked
    /// section is silently corrected and reported in the result.
    pub async fn run_reflection(&self, agent_id: &str, force: bool) -> Result<ReflectionReport> {
        let mut tracker = self.trackers.load(agent_id).await?;
        if !force && !tracker.is_due(Utc::now()) {
            return Ok(ReflectionReport::skipped("not due"));
        }

        let Some(persona) = self.personas.load(agent_id).await? else {
            return Ok(ReflectionReport::skipped("no persona document"));
        };

        let logs = match self
            .activity
            .recent_days(agent_id, REFLECTION_LOG_DAYS)
            .await
        {
            Ok(logs) => logs,
            Err(e) => {
                warn!(agent_id, "activity logs unavailable for reflection: {e:#}");
                Vec::new()
            }
        };

        let request = TurnRequest {
            prompt: build_reflection_prompt(&persona, &logs),
            system_context: None,
            resume_session_id: None,
            timeout: self.config.turn_timeout(),
        };
        let outcome = self
            .reasoner
            .run_turn(request, CancellationToken::new())
            .await?;

        let result = match outcome {
            TurnOutcome::Completed(result) => result,
            TurnOutcome::Cancelled => return Ok(ReflectionReport::skipped("cancelled")),
        };

        // The cycle ran; the clock restarts even if nothing is applied.
        tracker.mark_reflected(Utc::now());
        self.trackers.save(agent_id, &tracker).await?;

        let Some(revision) = extract_revision(&result.text) else {
            info!(agent_id, "reflection produced no usable revision");
            return Ok(ReflectionReport::skipped("no revision produced"));
        };

        let (restored, corrected) = restore_locked_section(&persona, &revision);
        if corrected {
            warn!(agent_id, "reflection tried to alter the locked section");
        }
        if restored.trim_end() == persona.trim_end() {
            return Ok(ReflectionReport {
                applied: false,
                corrected_locked_section: corrected,
                note: Some("document unchanged".to_string()),
            });
        }

        self.personas.snapshot(agent_id).await?;
        self.personas.save(agent_id, &restored).await?;
        info!(agent_id, corrected, "reflection applied");
        let _ = self.events.send(EngineEvent::ReflectionApplied {
            agent_id: agent_id.to_string(),
            corrected_locked_section: corrected,
        });

        Ok(ReflectionReport {
            applied: true,
            corrected_locked_section: corrected,
            note: None,
        })
    }

    /// Lists persona snapshots, newest first.
    pub async fn reflection_history(
        &self,
        agent_id: &str,
        limit: usize,
    ) -> Result<Vec<VersionSummary>> {
        self.personas.history(agent_id, limit).await
    }

    /// Returns one persona snapshot by strict `YYYY-MM-DD` date key.
    pub async fn reflection_history_entry(
        &self,
        agent_id: &str,
        date: &str,
    ) -> Result<Option<String>> {
        self.personas.history_entry(agent_id, date).await
    }
}
