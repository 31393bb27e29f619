//! Error types for agent-runner

use std::time::Duration;

use thiserror::Error;

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Errors that can occur while generating a reply
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The upstream agent rejected or failed the request
    #[error("Agent request failed: {message}")]
    Agent { message: String },

    /// Transport failure talking to the agent
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The fragment stream broke off mid-reply
    #[error("Stream error: {message}")]
    Stream { message: String },

    /// The agent went quiet for longer than the reply timeout
    #[error("Agent stalled: no output for {after:?}")]
    Timeout { after: Duration },

    /// Unknown message role
    #[error("Invalid role: {role}")]
    InvalidRole { role: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RunnerError {
    /// Create an Agent error
    pub fn agent(message: impl Into<String>) -> Self {
        Self::Agent {
            message: message.into(),
        }
    }

    /// Create a Stream error
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream {
            message: message.into(),
        }
    }
}
