//! System context assembly for a turn.

use std::sync::Arc;

use tracing::warn;

use hearth_core::context::{is_placeholder, ActivityLog, ContextProvider};
use hearth_core::persona::PersonaStore;

/// Upper bound on today's activity excerpt.
pub const TODAY_EXCERPT_MAX_CHARS: usize = 2000;

/// Builds the system context for one turn.
///
/// Parts appear in a fixed order: platform identity, persona document,
/// human profile, workspace notes, curated memory, then the tail of
/// today's activity log. Missing, empty, and placeholder parts are
/// skipped; a provider error is logged and treated as absent so one
/// broken source never blocks a turn. Returns `None` when nothing is
/// available.
pub async fn assemble_context(
    agent_id: &str,
    personas: &Arc<dyn PersonaStore>,
    provider: &Arc<dyn ContextProvider>,
    activity: &Arc<dyn ActivityLog>,
) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    push_part(&mut parts, None, provider.identity(agent_id).await, "identity");
    push_part(&mut parts, None, personas.load(agent_id).await, "persona");
    push_part(
        &mut parts,
        Some("# About your human"),
        provider.human_profile(agent_id).await,
        "human profile",
    );
    push_part(
        &mut parts,
        Some("# Workspace notes"),
        provider.workspace_notes(agent_id).await,
        "workspace notes",
    );
    push_part(
        &mut parts,
        Some("# Memory"),
        provider.curated_memory(agent_id).await,
        "curated memory",
    );
    push_part(
        &mut parts,
        Some("# Today so far"),
        activity
            .today_excerpt(agent_id, TODAY_EXCERPT_MAX_CHARS)
            .await,
        "activity log",
    );

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

fn push_part(
    parts: &mut Vec<String>,
    heading: Option<&str>,
    fetched: anyhow::Result<Option<String>>,
    source: &str,
) {
    let content = match fetched {
        Ok(Some(content)) => content,
        Ok(None) => return,
        Err(e) => {
            warn!(source, "context source unavailable: {e:#}");
            return;
        }
    };
    if is_placeholder(&content) {
        return;
    }
    let content = content.trim_end();
    match heading {
        Some(heading) => parts.push(format!("{heading}\n\n{content}")),
        None => parts.push(content.to_string()),
    }
}
