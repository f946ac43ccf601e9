//! Day-bucketed version history for markdown documents.
//!
//! Snapshots live as `YYYY-MM-DD.md` files in a history directory, at
//! most one per calendar day. Saving twice on one day with identical
//! content is a no-op; distinct content overwrites the day's snapshot.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::fs;

use hearth_core::persona::VersionSummary;
use hearth_core::{datekey, HearthError};

/// Snapshots `source` into `history_dir` under today's date key.
///
/// Returns whether a file was written. A missing source is a no-op.
pub async fn save_version(source: &Path, history_dir: &Path) -> Result<bool> {
    if !source.exists() {
        return Ok(false);
    }
    let content = fs::read_to_string(source)
        .await
        .with_context(|| format!("failed to read {}", source.display()))?;

    let today = Utc::now().format("%Y-%m-%d").to_string();
    let target = history_dir.join(format!("{today}.md"));

    if target.exists() {
        let existing = fs::read_to_string(&target)
            .await
            .with_context(|| format!("failed to read {}", target.display()))?;
        if existing == content {
            return Ok(false);
        }
    }

    fs::create_dir_all(history_dir)
        .await
        .with_context(|| format!("failed to create {}", history_dir.display()))?;
    fs::write(&target, &content)
        .await
        .with_context(|| format!("failed to write {}", target.display()))?;
    Ok(true)
}

/// Lists snapshots newest first, up to `limit`.
pub async fn get_history(history_dir: &Path, limit: usize) -> Result<Vec<VersionSummary>> {
    let mut dates = Vec::new();
    let mut entries = match fs::read_dir(history_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to list {}", history_dir.display()))
        }
    };

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(stem) = name.strip_suffix(".md") {
            if datekey::is_valid(stem) {
                dates.push(stem.to_string());
            }
        }
    }

    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.truncate(limit);

    let mut history = Vec::with_capacity(dates.len());
    for date in dates {
        let content = fs::read_to_string(history_dir.join(format!("{date}.md"))).await?;
        let summary = content
            .lines()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("")
            .trim()
            .to_string();
        history.push(VersionSummary { date, summary });
    }
    Ok(history)
}

/// Reads the full snapshot for a date key, or `None` when absent.
///
/// The key must be a strict `YYYY-MM-DD` value; anything else is
/// refused without touching the filesystem.
pub async fn get_content(history_dir: &Path, date: &str) -> Result<Option<String>> {
    if !datekey::is_valid(date) {
        return Err(HearthError::Security(format!("invalid date key: {date:?}")).into());
    }
    let path = history_dir.join(format!("{date}.md"));
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Some(content))
}
