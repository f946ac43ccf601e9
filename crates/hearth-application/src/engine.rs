//! The interaction engine: one user message in, one reply out.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use hearth_core::context::{ActivityLog, ContextProvider, NullContextProvider};
use hearth_core::conversation::{derive_label, ChatRepository, ConversationStore, Message};
use hearth_core::persona::PersonaStore;
use hearth_core::reasoner::{Reasoner, TurnOutcome, TurnRequest};
use hearth_core::reflection::ReflectionTrackerRepository;
use hearth_core::resume::SessionResumeRepository;
use hearth_core::{EngineConfig, HearthError};

use hearth_infrastructure::{
    FileActivityLog, FilePersonaStore, HearthPaths, JsonChatRepository,
    JsonReflectionTrackerRepository, JsonSessionResumeRepository,
};
use hearth_interaction::ClaudeCliReasoner;

use crate::cancellation::{CancellationRegistry, ConversationKey};
use crate::context_assembly::assemble_context;
use crate::events::EngineEvent;
use crate::reflection::ReflectionReport;

/// Result of handling one user message.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleOutcome {
    /// The turn completed; the assistant message is already persisted.
    Replied {
        conversation_id: String,
        message: Message,
    },
    /// The turn was cancelled; only the user message was persisted.
    Cancelled { conversation_id: String },
}

/// Orchestrates conversations, turns, cancellation, and reflection.
///
/// Every collaborator is injected; the engine owns no I/O of its own.
/// A user message is durable before any turn starts, and a reply is
/// durable before it is announced, so a crash can lose at most the
/// in-flight turn, never accepted history.
pub struct InteractionEngine {
    pub(crate) conversations: ConversationStore,
    pub(crate) personas: Arc<dyn PersonaStore>,
    pub(crate) trackers: Arc<dyn ReflectionTrackerRepository>,
    pub(crate) resume: Arc<dyn SessionResumeRepository>,
    pub(crate) context: Arc<dyn ContextProvider>,
    pub(crate) activity: Arc<dyn ActivityLog>,
    pub(crate) reasoner: Arc<dyn Reasoner>,
    pub(crate) registry: CancellationRegistry,
    pub(crate) events: broadcast::Sender<EngineEvent>,
    pub(crate) config: EngineConfig,
}

impl InteractionEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chats: Arc<dyn ChatRepository>,
        personas: Arc<dyn PersonaStore>,
        trackers: Arc<dyn ReflectionTrackerRepository>,
        resume: Arc<dyn SessionResumeRepository>,
        context: Arc<dyn ContextProvider>,
        activity: Arc<dyn ActivityLog>,
        reasoner: Arc<dyn Reasoner>,
        config: EngineConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            conversations: ConversationStore::new(chats),
            personas,
            trackers,
            resume,
            context,
            activity,
            reasoner,
            registry: CancellationRegistry::new(),
            events,
            config,
        }
    }

    /// Wires the file-backed repositories under `root` around the
    /// given reasoner.
    pub fn with_file_backends(
        root: impl Into<PathBuf>,
        config: EngineConfig,
        reasoner: Arc<dyn Reasoner>,
    ) -> Self {
        let paths = HearthPaths::new(root);
        Self::new(
            Arc::new(JsonChatRepository::new(paths.clone())),
            Arc::new(FilePersonaStore::new(paths.clone())),
            Arc::new(JsonReflectionTrackerRepository::new(
                paths.clone(),
                config.reflection_interval,
            )),
            Arc::new(JsonSessionResumeRepository::new(paths.clone())),
            Arc::new(NullContextProvider),
            Arc::new(FileActivityLog::new(paths)),
            reasoner,
            config,
        )
    }

    /// File backends plus the Claude CLI reasoner from the config.
    pub fn with_claude_cli(root: impl Into<PathBuf>, config: EngineConfig) -> Self {
        let root = root.into();
        let reasoner = Arc::new(
            ClaudeCliReasoner::new(config.reasoner_binary.clone(), config.allowed_tools.clone())
                .with_workspace_root(root.clone()),
        );
        Self::with_file_backends(root, config, reasoner)
    }

    /// Subscribes to engine progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Conversation management (create, list, relabel, delete).
    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    fn emit(&self, event: EngineEvent) {
        // Nobody listening is fine; events are advisory.
        let _ = self.events.send(event);
    }

    /// Handles one user message end to end.
    ///
    /// Persists the user message, runs a single reasoner turn with the
    /// assembled context and any resumable session, persists the reply,
    /// and records the session id for the next turn. A concurrent
    /// message or an explicit [`cancel`](Self::cancel) supersedes the
    /// in-flight turn, which then reports
    /// [`HandleOutcome::Cancelled`] and persists nothing further.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::NotFound`] (through `anyhow`) when an
    /// explicit conversation id is unknown, and I/O errors from the
    /// chat repository. Reasoner failures do not surface here; they
    /// degrade to fallback reply text.
    pub async fn handle_message(
        &self,
        agent_id: &str,
        conversation_id: Option<&str>,
        text: &str,
        attachments: Vec<String>,
    ) -> Result<HandleOutcome> {
        let conversation_id = match conversation_id {
            Some(id) => {
                if self
                    .conversations
                    .get_conversation(agent_id, id)
                    .await?
                    .is_none()
                {
                    return Err(HearthError::not_found("conversation", id).into());
                }
                id.to_string()
            }
            None => {
                self.conversations
                    .create_conversation(agent_id, None)
                    .await?
                    .id
            }
        };

        let user = Message::user(agent_id, text).with_attachments(attachments);
        let user_id = user.id.clone();
        self.conversations
            .append_message(agent_id, &conversation_id, user)
            .await?;
        self.emit(EngineEvent::MessageAccepted {
            agent_id: agent_id.to_string(),
            conversation_id: conversation_id.clone(),
            message_id: user_id,
        });
        self.emit(EngineEvent::Working {
            agent_id: agent_id.to_string(),
            conversation_id: conversation_id.clone(),
        });

        let key = ConversationKey::new(agent_id, &conversation_id);
        let (generation, token) = self.registry.register(key.clone());

        let system_context =
            assemble_context(agent_id, &self.personas, &self.context, &self.activity).await;
        let resume_session_id = match self.resume.get(agent_id, &conversation_id).await {
            Ok(session_id) => session_id,
            Err(e) => {
                warn!(agent_id, %conversation_id, "resume lookup failed: {e:#}");
                None
            }
        };

        let request = TurnRequest {
            prompt: text.to_string(),
            system_context,
            resume_session_id,
            timeout: self.config.turn_timeout(),
        };
        debug!(agent_id, %conversation_id, "running turn");

        let outcome = match self.reasoner.run_turn(request, token.clone()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.registry.release(&key, generation);
                return Err(e);
            }
        };

        let result = match outcome {
            TurnOutcome::Completed(result) if !token.is_cancelled() => result,
            _ => {
                self.registry.release(&key, generation);
                self.emit(EngineEvent::TurnCancelled {
                    agent_id: agent_id.to_string(),
                    conversation_id: conversation_id.clone(),
                });
                info!(agent_id, %conversation_id, "turn cancelled");
                return Ok(HandleOutcome::Cancelled { conversation_id });
            }
        };

        if let Some(session_id) = &result.session_id {
            if let Err(e) = self.resume.set(agent_id, &conversation_id, session_id).await {
                warn!(agent_id, %conversation_id, "failed to record session id: {e:#}");
            }
        }

        let reply = Message::assistant(agent_id, result.text, result.session_id);
        let reply_id = reply.id.clone();
        self.conversations
            .append_message(agent_id, &conversation_id, reply.clone())
            .await?;
        self.registry.release(&key, generation);
        self.emit(EngineEvent::ReplyReady {
            agent_id: agent_id.to_string(),
            conversation_id: conversation_id.clone(),
            message_id: reply_id,
        });

        let log_line = format!("{} replied to: {}", Utc::now().format("%H:%M"), derive_label(text));
        if let Err(e) = self.activity.append(agent_id, &log_line).await {
            warn!(agent_id, "failed to record activity: {e:#}");
        }

        Ok(HandleOutcome::Replied {
            conversation_id,
            message: reply,
        })
    }

    /// Cancels the in-flight turn for a conversation, if any.
    pub fn cancel(&self, agent_id: &str, conversation_id: &str) -> bool {
        self.registry
            .cancel(&ConversationKey::new(agent_id, conversation_id))
    }

    /// Records a completed conversational session and runs a
    /// reflection when one has become due.
    pub async fn on_session_completed(&self, agent_id: &str) -> Result<Option<ReflectionReport>> {
        let mut tracker = self.trackers.load(agent_id).await?;
        tracker.record_session();
        self.trackers.save(agent_id, &tracker).await?;

        if tracker.is_due(Utc::now()) {
            let report = self.run_reflection(agent_id, false).await?;
            return Ok(Some(report));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hearth_core::reasoner::TurnResult;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    /// Records requests and echoes the prompt back.
    struct EchoReasoner {
        requests: Mutex<Vec<TurnRequest>>,
    }

    impl EchoReasoner {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Reasoner for EchoReasoner {
        async fn run_turn(
            &self,
            request: TurnRequest,
            _cancel: CancellationToken,
        ) -> Result<TurnOutcome> {
            let text = format!("echo: {}", request.prompt);
            self.requests.lock().unwrap().push(request);
            Ok(TurnOutcome::Completed(TurnResult {
                text,
                session_id: Some("s-echo".to_string()),
            }))
        }
    }

    /// Blocks on "slow" prompts until cancelled; echoes otherwise.
    struct SlowReasoner;

    #[async_trait]
    impl Reasoner for SlowReasoner {
        async fn run_turn(
            &self,
            request: TurnRequest,
            cancel: CancellationToken,
        ) -> Result<TurnOutcome> {
            if request.prompt.contains("slow") {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(TurnOutcome::Cancelled),
                    _ = tokio::time::sleep(std::time::Duration::from_secs(10)) => {}
                }
            }
            Ok(TurnOutcome::Completed(TurnResult {
                text: format!("echo: {}", request.prompt),
                session_id: None,
            }))
        }
    }

    fn engine_with(reasoner: Arc<dyn Reasoner>, dir: &std::path::Path) -> InteractionEngine {
        InteractionEngine::with_file_backends(dir, EngineConfig::default(), reasoner)
    }

    #[tokio::test]
    async fn a_message_creates_a_conversation_and_persists_both_sides() {
        let dir = tempfile::tempdir().unwrap();
        let reasoner = EchoReasoner::new();
        let engine = engine_with(reasoner.clone(), dir.path());

        let outcome = engine
            .handle_message("mai", None, "what's on my calendar today", vec![])
            .await
            .unwrap();

        let HandleOutcome::Replied {
            conversation_id,
            message,
        } = outcome
        else {
            panic!("expected a reply");
        };
        assert_eq!(message.text, "echo: what's on my calendar today");

        let conversation = engine
            .conversations()
            .get_conversation("mai", &conversation_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.label, "what's on my calendar today");
    }

    #[tokio::test]
    async fn the_second_turn_resumes_the_recorded_session() {
        let dir = tempfile::tempdir().unwrap();
        let reasoner = EchoReasoner::new();
        let engine = engine_with(reasoner.clone(), dir.path());

        let HandleOutcome::Replied { conversation_id, .. } = engine
            .handle_message("mai", None, "first", vec![])
            .await
            .unwrap()
        else {
            panic!("expected a reply");
        };
        engine
            .handle_message("mai", Some(&conversation_id), "second", vec![])
            .await
            .unwrap();

        let requests = reasoner.requests.lock().unwrap();
        assert_eq!(requests[0].resume_session_id, None);
        assert_eq!(requests[1].resume_session_id.as_deref(), Some("s-echo"));
    }

    #[tokio::test]
    async fn unknown_conversation_id_is_rejected_before_anything_persists() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with(EchoReasoner::new(), dir.path());

        let err = engine
            .handle_message("mai", Some("missing"), "hello", vec![])
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<HearthError>().is_some());
        assert!(engine
            .conversations()
            .list_conversations("mai")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn cancel_keeps_the_user_message_and_discards_the_reply() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(engine_with(Arc::new(SlowReasoner), dir.path()));

        let conversation = engine
            .conversations()
            .create_conversation("mai", None)
            .await
            .unwrap();

        let task_engine = engine.clone();
        let id = conversation.id.clone();
        let task = tokio::spawn(async move {
            task_engine
                .handle_message("mai", Some(&id), "slow question", vec![])
                .await
        });

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(engine.cancel("mai", &conversation.id));

        let outcome = task.await.unwrap().unwrap();
        assert!(matches!(outcome, HandleOutcome::Cancelled { .. }));

        let conversation = engine
            .conversations()
            .get_conversation("mai", &conversation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].text, "slow question");
    }

    #[tokio::test]
    async fn a_new_message_supersedes_the_inflight_turn() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(engine_with(Arc::new(SlowReasoner), dir.path()));

        let conversation = engine
            .conversations()
            .create_conversation("mai", None)
            .await
            .unwrap();

        let task_engine = engine.clone();
        let id = conversation.id.clone();
        let first = tokio::spawn(async move {
            task_engine
                .handle_message("mai", Some(&id), "slow one", vec![])
                .await
        });
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        let second = engine
            .handle_message("mai", Some(&conversation.id), "quick one", vec![])
            .await
            .unwrap();
        assert!(matches!(second, HandleOutcome::Replied { .. }));

        let first = first.await.unwrap().unwrap();
        assert!(matches!(first, HandleOutcome::Cancelled { .. }));

        // Both user messages persisted, but only the second got a reply.
        let conversation = engine
            .conversations()
            .get_conversation("mai", &conversation.id)
            .await
            .unwrap()
            .unwrap();
        let texts: Vec<_> = conversation.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["slow one", "quick one", "echo: quick one"]);
    }

    #[tokio::test]
    async fn events_follow_the_turn_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with(EchoReasoner::new(), dir.path());
        let mut events = engine.subscribe();

        engine
            .handle_message("mai", None, "hello", vec![])
            .await
            .unwrap();

        assert!(matches!(
            events.recv().await.unwrap(),
            EngineEvent::MessageAccepted { .. }
        ));
        assert!(matches!(events.recv().await.unwrap(), EngineEvent::Working { .. }));
        assert!(matches!(
            events.recv().await.unwrap(),
            EngineEvent::ReplyReady { .. }
        ));
    }

    #[tokio::test]
    async fn cancel_with_no_turn_in_flight_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with(EchoReasoner::new(), dir.path());
        assert!(!engine.cancel("mai", "c-1"));
    }
}
