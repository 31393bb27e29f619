//! Agent sessions
//!
//! A session owns one conversation: the system instruction and the history of
//! turns. Sessions are held by a [`SessionManager`] keyed by session id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pl_core::registry::InstructionSink;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

use crate::agent::{AgentSettings, ChatAgent, ChatRequest, FragmentStream};
use crate::error::{Result, RunnerError};
use crate::message::{ChatMessage, MessageRole};

/// Session used when a client does not name one
pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Debug, Clone)]
struct Conversation {
    instruction: ChatMessage,
    history: Vec<ChatMessage>,
    /// Bumped by `clear`, so replies to a cleared conversation are dropped
    epoch: u64,
}

/// Exclusive right to the session for one turn
///
/// Held from the user append until the reply is recorded, so the next turn of
/// the same session cannot begin before that. Dropping it ends the turn.
pub struct TurnGuard {
    epoch: u64,
    _lock: OwnedMutexGuard<()>,
}

/// One conversation with the agent
pub struct AgentSession {
    pub id: String,
    agent: Arc<dyn ChatAgent>,
    max_history_messages: usize,
    reply_timeout: Duration,
    conversation: RwLock<Conversation>,
    turn_lock: Arc<Mutex<()>>,
}

impl AgentSession {
    pub fn new(
        id: impl Into<String>,
        agent: Arc<dyn ChatAgent>,
        settings: &AgentSettings,
        instruction: ChatMessage,
    ) -> Self {
        Self {
            id: id.into(),
            agent,
            max_history_messages: settings.max_history_messages,
            reply_timeout: settings.reply_timeout,
            conversation: RwLock::new(Conversation {
                instruction,
                history: Vec::new(),
                epoch: 0,
            }),
            turn_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Current system instruction text
    pub async fn system_message(&self) -> String {
        self.conversation.read().await.instruction.content.clone()
    }

    /// Replace the system instruction; past turns are left as they are
    pub async fn set_system_message(&self, text: impl Into<String>, role: MessageRole) {
        let mut conversation = self.conversation.write().await;
        conversation.instruction = ChatMessage::new(role, text);
        debug!("Session {} instruction replaced", self.id);
    }

    /// Append a user turn verbatim
    pub async fn append_user_message(&self, text: impl Into<String>) {
        self.conversation
            .write()
            .await
            .history
            .push(ChatMessage::user(text));
    }

    /// Forget the history, keep the instruction
    pub async fn clear(&self) {
        let mut conversation = self.conversation.write().await;
        conversation.history.clear();
        conversation.epoch += 1;
        info!("Session {} cleared", self.id);
    }

    /// Copy of the history
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.conversation.read().await.history.clone()
    }

    /// Ask the agent for a reply to the current conversation
    pub async fn begin_generation(&self) -> Result<FragmentStream> {
        let request = self.build_request().await;
        self.agent.stream_reply(request).await
    }

    /// Append `text` as a user turn and start generating the reply
    ///
    /// Waits for any earlier turn of this session to finish first. The agent
    /// must start replying within the reply timeout.
    pub async fn start_turn(&self, text: impl Into<String>) -> Result<(FragmentStream, TurnGuard)> {
        let lock = Arc::clone(&self.turn_lock).lock_owned().await;

        let (request, epoch) = {
            let mut conversation = self.conversation.write().await;
            conversation.history.push(ChatMessage::user(text));
            (self.request_from(&conversation), conversation.epoch)
        };

        let fragments = tokio::time::timeout(self.reply_timeout, self.agent.stream_reply(request))
            .await
            .map_err(|_| RunnerError::Timeout {
                after: self.reply_timeout,
            })??;

        Ok((fragments, TurnGuard { epoch, _lock: lock }))
    }

    /// Record the assistant's reply for a finished turn
    pub async fn record_reply(&self, turn: &TurnGuard, text: impl Into<String>) {
        let mut conversation = self.conversation.write().await;
        if conversation.epoch != turn.epoch {
            warn!("Session {} was cleared mid-turn, dropping reply", self.id);
            return;
        }
        conversation.history.push(ChatMessage::assistant(text));
    }

    async fn build_request(&self) -> ChatRequest {
        let conversation = self.conversation.read().await;
        self.request_from(&conversation)
    }

    fn request_from(&self, conversation: &Conversation) -> ChatRequest {
        let history = &conversation.history;
        let start = match self.max_history_messages {
            0 => 0,
            max => history.len().saturating_sub(max),
        };

        let mut messages = Vec::with_capacity(history.len() - start + 1);
        messages.push(conversation.instruction.clone());
        messages.extend(history[start..].iter().cloned());
        ChatRequest { messages }
    }
}

/// Owns every session, keyed by id
pub struct SessionManager {
    agent: Arc<dyn ChatAgent>,
    settings: AgentSettings,
    /// Instruction new sessions start with
    default_instruction: RwLock<ChatMessage>,
    sessions: RwLock<HashMap<String, Arc<AgentSession>>>,
}

impl SessionManager {
    pub fn new(
        agent: Arc<dyn ChatAgent>,
        settings: AgentSettings,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            agent,
            settings,
            default_instruction: RwLock::new(ChatMessage::system(instruction)),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Get the session named `id`, creating it if needed
    pub async fn session(&self, id: &str) -> Arc<AgentSession> {
        if let Some(session) = self.sessions.read().await.get(id) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(id) {
            return Arc::clone(session);
        }

        // Read under the sessions lock so a concurrent instruction change
        // either sees this session or has already replaced the default.
        let instruction = self.default_instruction.read().await.clone();
        info!("Creating session {}", id);
        let session = Arc::new(AgentSession::new(
            id,
            Arc::clone(&self.agent),
            &self.settings,
            instruction,
        ));
        sessions.insert(id.to_string(), Arc::clone(&session));
        session
    }

    /// The session used when none is named
    pub async fn default_session(&self) -> Arc<AgentSession> {
        self.session(DEFAULT_SESSION_ID).await
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub fn agent_name(&self) -> &str {
        self.agent.name()
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }
}

#[async_trait]
impl InstructionSink for SessionManager {
    /// Install `text` in every live session and as the default for new ones
    async fn apply_system_instruction(&self, text: &str, role: &str) {
        let role = role.parse().unwrap_or(MessageRole::System);

        // Lock order is sessions, then default instruction, as in `session`
        let sessions = self.sessions.read().await;
        *self.default_instruction.write().await = ChatMessage::new(role, text);
        for session in sessions.values() {
            session.set_system_message(text, role).await;
        }
        info!("System instruction applied to {} sessions", sessions.len());
    }
}
