//! File-backed daily activity log.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use hearth_core::context::ActivityLog;
use hearth_core::datekey;

use crate::paths::{validate_agent_id, HearthPaths};

/// Appends agent activity to one markdown file per calendar day under
/// `agents/<id>/logs/`.
pub struct FileActivityLog {
    paths: HearthPaths,
}

impl FileActivityLog {
    pub fn new(paths: HearthPaths) -> Self {
        Self { paths }
    }

    fn today_key() -> String {
        Utc::now().format("%Y-%m-%d").to_string()
    }

    fn log_file(&self, agent_id: &str, date: &str) -> std::path::PathBuf {
        self.paths.activity_log_dir(agent_id).join(format!("{date}.md"))
    }
}

/// Last `max_chars` characters of `content`, cut on a char boundary.
fn tail_chars(content: &str, max_chars: usize) -> &str {
    let total = content.chars().count();
    if total <= max_chars {
        return content;
    }
    let skip = total - max_chars;
    let start = content
        .char_indices()
        .nth(skip)
        .map(|(i, _)| i)
        .unwrap_or(content.len());
    &content[start..]
}

#[async_trait]
impl ActivityLog for FileActivityLog {
    async fn today_excerpt(&self, agent_id: &str, max_chars: usize) -> Result<Option<String>> {
        validate_agent_id(agent_id)?;
        let path = self.log_file(agent_id, &Self::today_key());
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(tail_chars(&content, max_chars).to_string()))
    }

    async fn recent_days(&self, agent_id: &str, days: u32) -> Result<Vec<(String, String)>> {
        validate_agent_id(agent_id)?;
        let dir = self.paths.activity_log_dir(agent_id);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("failed to list {}", dir.display())),
        };

        let cutoff = Utc::now().date_naive() - Duration::days(i64::from(days.saturating_sub(1)));
        let mut dates = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(stem) = name.strip_suffix(".md") else { continue };
            if !datekey::is_valid(stem) {
                continue;
            }
            match NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
                Ok(date) if date >= cutoff => dates.push(stem.to_string()),
                _ => {}
            }
        }
        dates.sort_unstable();

        let mut logs = Vec::with_capacity(dates.len());
        for date in dates {
            let content = fs::read_to_string(self.log_file(agent_id, &date)).await?;
            logs.push((date, content));
        }
        Ok(logs)
    }

    async fn append(&self, agent_id: &str, line: &str) -> Result<()> {
        validate_agent_id(agent_id)?;
        let path = self.log_file(agent_id, &Self::today_key());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to open {}", path.display()))?;
        file.write_all(format!("{line}\n").as_bytes())
            .await
            .with_context(|| format!("failed to append to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_then_read_today() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileActivityLog::new(HearthPaths::new(dir.path()));

        assert_eq!(log.today_excerpt("mai", 2000).await.unwrap(), None);
        log.append("mai", "10:00 checked the calendar").await.unwrap();
        log.append("mai", "10:05 drafted a reply").await.unwrap();

        let excerpt = log.today_excerpt("mai", 2000).await.unwrap().unwrap();
        assert!(excerpt.contains("checked the calendar"));
        assert!(excerpt.contains("drafted a reply"));
    }

    #[tokio::test]
    async fn excerpt_keeps_the_tail_on_char_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileActivityLog::new(HearthPaths::new(dir.path()));

        log.append("mai", &"日記".repeat(50)).await.unwrap();
        let excerpt = log.today_excerpt("mai", 10).await.unwrap().unwrap();
        assert_eq!(excerpt.chars().count(), 10);
    }

    #[tokio::test]
    async fn recent_days_filters_and_sorts_ascending() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HearthPaths::new(dir.path());
        let log = FileActivityLog::new(paths.clone());
        let logs_dir = paths.activity_log_dir("mai");
        std::fs::create_dir_all(&logs_dir).unwrap();

        let today = Utc::now().date_naive();
        let recent = (today - Duration::days(2)).format("%Y-%m-%d").to_string();
        let ancient = (today - Duration::days(30)).format("%Y-%m-%d").to_string();
        std::fs::write(logs_dir.join(format!("{recent}.md")), "recent\n").unwrap();
        std::fs::write(logs_dir.join(format!("{ancient}.md")), "ancient\n").unwrap();
        std::fs::write(
            logs_dir.join(format!("{}.md", today.format("%Y-%m-%d"))),
            "today\n",
        )
        .unwrap();

        let days = log.recent_days("mai", 7).await.unwrap();
        let dates: Vec<_> = days.iter().map(|(d, _)| d.clone()).collect();
        assert_eq!(dates, vec![recent, today.format("%Y-%m-%d").to_string()]);
    }

    #[tokio::test]
    async fn no_log_dir_means_no_days() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileActivityLog::new(HearthPaths::new(dir.path()));
        assert!(log.recent_days("mai", 7).await.unwrap().is_empty());
    }

    #[test]
    fn tail_is_exact_when_content_fits() {
        assert_eq!(tail_chars("short", 10), "short");
        assert_eq!(tail_chars("abcdef", 3), "def");
    }
}
