//! Agent capability
//!
//! An agent turns a conversation into a finite stream of text fragments.
//! The stream is consumed exactly once by the job that asked for it.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

use crate::error::Result;
use crate::message::{ChatMessage, MessageRole};

/// Incremental reply text, in order
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Generation settings shared by all sessions
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Model name sent upstream
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound on reply tokens
    pub max_tokens: u32,
    /// Most recent history turns sent with each request (0 = unlimited)
    pub max_history_messages: usize,
    /// Longest wait for the agent to start a reply or send the next fragment
    pub reply_timeout: Duration,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
            max_tokens: 2000,
            max_history_messages: 40,
            reply_timeout: Duration::from_secs(120),
        }
    }
}

/// A conversation ready to be sent to an agent
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Instruction first, then history in order
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Content of the most recent user turn
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

/// Something that can stream a reply to a conversation
#[async_trait]
pub trait ChatAgent: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Start generating a reply
    async fn stream_reply(&self, request: ChatRequest) -> Result<FragmentStream>;
}

/// Offline agent that echoes the last user message word by word
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoAgent;

#[async_trait]
impl ChatAgent for EchoAgent {
    fn name(&self) -> &str {
        "echo"
    }

    async fn stream_reply(&self, request: ChatRequest) -> Result<FragmentStream> {
        let reply = format!("You said: {}", request.last_user_message().unwrap_or(""));
        let fragments: Vec<Result<String>> = reply
            .split_inclusive(' ')
            .map(|word| Ok(word.to_string()))
            .collect();
        Ok(stream::iter(fragments).boxed())
    }
}
