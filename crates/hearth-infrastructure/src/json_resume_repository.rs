//! JSON-file session resume repository.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use hearth_core::resume::SessionResumeRepository;

use crate::paths::HearthPaths;
use crate::storage::{read_json_or_default, write_json};

/// Stores the latest reasoning-process session id per conversation in
/// a single flat file at the data root.
///
/// Keys are `<agent_id>/<conversation_id>`. The file is small and is
/// rewritten whole on every update; a lock serializes updates so
/// concurrent turns cannot lose each other's writes.
pub struct JsonSessionResumeRepository {
    paths: HearthPaths,
    write_lock: Mutex<()>,
}

impl JsonSessionResumeRepository {
    pub fn new(paths: HearthPaths) -> Self {
        Self {
            paths,
            write_lock: Mutex::new(()),
        }
    }

    fn key(agent_id: &str, conversation_id: &str) -> String {
        format!("{agent_id}/{conversation_id}")
    }
}

#[async_trait]
impl SessionResumeRepository for JsonSessionResumeRepository {
    async fn get(&self, agent_id: &str, conversation_id: &str) -> Result<Option<String>> {
        let map: HashMap<String, String> =
            read_json_or_default(&self.paths.resume_file()).await?;
        Ok(map.get(&Self::key(agent_id, conversation_id)).cloned())
    }

    async fn set(&self, agent_id: &str, conversation_id: &str, session_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.paths.resume_file();
        let mut map: HashMap<String, String> = read_json_or_default(&path).await?;
        map.insert(Self::key(agent_id, conversation_id), session_id.to_string());
        write_json(&path, &map).await
    }
}
