//! Reasoner backed by the Claude CLI subprocess.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use hearth_core::reasoner::{
    Reasoner, TurnOutcome, TurnRequest, TurnResult, FALLBACK_FAILURE_TEXT,
};

use crate::stream::{parse_line, TurnAccumulator};

/// Executes turns by spawning the `claude` CLI in streaming JSON mode
/// and folding its NDJSON output into a reply.
pub struct ClaudeCliReasoner {
    binary: String,
    workspace_root: Option<PathBuf>,
    allowed_tools: Vec<String>,
}

impl ClaudeCliReasoner {
    pub fn new(binary: impl Into<String>, allowed_tools: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            workspace_root: None,
            allowed_tools,
        }
    }

    /// Sets the working directory the subprocess runs in.
    pub fn with_workspace_root(mut self, root: PathBuf) -> Self {
        self.workspace_root = Some(root);
        self
    }

    fn build_command(&self, request: &TurnRequest) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-p")
            .arg(&request.prompt)
            .arg("--output-format")
            .arg("stream-json")
            .arg("--verbose");

        if let Some(context) = &request.system_context {
            cmd.arg("--append-system-prompt").arg(context);
        }
        if let Some(session_id) = &request.resume_session_id {
            cmd.arg("--resume").arg(session_id);
        }
        if !self.allowed_tools.is_empty() {
            cmd.arg("--allowedTools").arg(self.allowed_tools.join(","));
        }
        if let Some(root) = &self.workspace_root {
            cmd.current_dir(root);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Drains stderr concurrently so the child never blocks on a full
/// pipe.
fn drain_stderr(stderr: ChildStderr) -> JoinHandle<String> {
    tokio::spawn(async move {
        let mut buf = String::new();
        let mut reader = BufReader::new(stderr);
        if let Err(e) = reader.read_to_string(&mut buf).await {
            warn!("failed to read reasoner stderr: {e}");
        }
        buf
    })
}

#[async_trait]
impl Reasoner for ClaudeCliReasoner {
    async fn run_turn(
        &self,
        request: TurnRequest,
        cancel: CancellationToken,
    ) -> Result<TurnOutcome> {
        if cancel.is_cancelled() {
            debug!("turn cancelled before spawn");
            return Ok(TurnOutcome::Cancelled);
        }

        let mut cmd = self.build_command(&request);
        debug!(binary = %self.binary, resume = ?request.resume_session_id, "spawning reasoner");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(binary = %self.binary, "failed to spawn reasoner: {e}");
                return Ok(TurnOutcome::Completed(TurnResult {
                    text: FALLBACK_FAILURE_TEXT.to_string(),
                    session_id: None,
                }));
            }
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("reasoner stdout was not captured"))?;
        let stderr_task = match child.stderr.take() {
            Some(stderr) => Some(drain_stderr(stderr)),
            None => None,
        };

        let mut lines = BufReader::new(stdout).lines();
        let mut accumulator = TurnAccumulator::new();
        let deadline = tokio::time::sleep(request.timeout);
        tokio::pin!(deadline);
        let mut timed_out = false;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("turn cancelled, killing reasoner");
                    if let Err(e) = child.kill().await {
                        warn!("failed to kill reasoner: {e}");
                    }
                    return Ok(TurnOutcome::Cancelled);
                }
                _ = &mut deadline => {
                    warn!(timeout = ?request.timeout, "turn deadline reached, killing reasoner");
                    if let Err(e) = child.kill().await {
                        warn!("failed to kill reasoner: {e}");
                    }
                    timed_out = true;
                    break;
                }
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if let Some(event) = parse_line(&line) {
                                accumulator.feed(event);
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            warn!("error reading reasoner stdout: {e}");
                            break;
                        }
                    }
                }
            }
        }

        let exit_ok = if timed_out {
            false
        } else {
            match child.wait().await {
                Ok(status) => status.success(),
                Err(e) => {
                    warn!("failed to wait for reasoner: {e}");
                    false
                }
            }
        };

        let stderr_output = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        // A cancellation that raced the process exit still counts.
        if cancel.is_cancelled() {
            return Ok(TurnOutcome::Cancelled);
        }

        let result = accumulator.finalize(exit_ok, &stderr_output);
        debug!(
            chars = result.text.len(),
            session = ?result.session_id,
            "turn finished"
        );
        Ok(TurnOutcome::Completed(result))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    fn write_script(dir: &std::path::Path, body: &str) -> PathBuf {
        let path = dir.join("fake-claude.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn request(timeout_ms: u64) -> TurnRequest {
        TurnRequest {
            prompt: "hello".to_string(),
            system_context: None,
            resume_session_id: None,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[tokio::test]
    async fn result_event_becomes_the_reply() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            r#"echo '{"type":"system","subtype":"init","session_id":"s-42"}'
echo '{"type":"result","result":"hi there","session_id":"s-42"}'"#,
        );

        let reasoner = ClaudeCliReasoner::new(script.to_string_lossy(), vec![]);
        let outcome = reasoner
            .run_turn(request(5_000), CancellationToken::new())
            .await
            .unwrap();

        let TurnOutcome::Completed(result) = outcome else {
            panic!("expected a completed turn");
        };
        assert_eq!(result.text, "hi there");
        assert_eq!(result.session_id.as_deref(), Some("s-42"));
    }

    #[tokio::test]
    async fn assistant_text_survives_process_failure() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            r#"echo '{"type":"assistant","message":{"content":[{"type":"text","text":"partial"}]}}'
exit 1"#,
        );

        let reasoner = ClaudeCliReasoner::new(script.to_string_lossy(), vec![]);
        let outcome = reasoner
            .run_turn(request(5_000), CancellationToken::new())
            .await
            .unwrap();

        let TurnOutcome::Completed(result) = outcome else {
            panic!("expected a completed turn");
        };
        assert_eq!(result.text, "partial");
    }

    #[tokio::test]
    async fn pre_cancelled_token_skips_the_spawn() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let reasoner = ClaudeCliReasoner::new("/nonexistent/binary", vec![]);
        let outcome = reasoner.run_turn(request(5_000), cancel).await.unwrap();
        assert_eq!(outcome, TurnOutcome::Cancelled);
    }

    #[tokio::test]
    async fn spawn_failure_yields_fallback_text() {
        let reasoner = ClaudeCliReasoner::new("/nonexistent/binary", vec![]);
        let outcome = reasoner
            .run_turn(request(5_000), CancellationToken::new())
            .await
            .unwrap();

        let TurnOutcome::Completed(result) = outcome else {
            panic!("expected a completed turn");
        };
        assert_eq!(result.text, FALLBACK_FAILURE_TEXT);
        assert_eq!(result.session_id, None);
    }

    #[tokio::test]
    async fn deadline_keeps_partial_text() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            r#"echo '{"type":"assistant","message":{"content":[{"type":"text","text":"so far"}]}}'
sleep 10"#,
        );

        let reasoner = ClaudeCliReasoner::new(script.to_string_lossy(), vec![]);
        let outcome = reasoner
            .run_turn(request(300), CancellationToken::new())
            .await
            .unwrap();

        let TurnOutcome::Completed(result) = outcome else {
            panic!("expected a completed turn");
        };
        assert_eq!(result.text, "so far");
    }

    #[tokio::test]
    async fn cancellation_mid_turn_kills_the_process() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "sleep 10");

        let reasoner = ClaudeCliReasoner::new(script.to_string_lossy(), vec![]);
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel_clone.cancel();
        });

        let outcome = reasoner.run_turn(request(30_000), cancel).await.unwrap();
        assert_eq!(outcome, TurnOutcome::Cancelled);
    }
}
