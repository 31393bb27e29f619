//! Agent Runner - background chat turns against a streaming agent
//!
//! This crate owns the conversation sessions, the agent clients that stream
//! replies, and the job executor that publishes partial output to a result
//! store for pollers.

mod agent;
mod client;
mod error;
mod executor;
mod job;
mod message;
mod session;
mod store;

#[cfg(test)]
mod test_support;

pub use agent::{AgentSettings, ChatAgent, ChatRequest, EchoAgent, FragmentStream};
pub use client::{OpenAiClient, DEFAULT_BASE_URL};
pub use error::{Result, RunnerError};
pub use executor::{run, JobExecutor};
pub use job::{JobSnapshot, JobStatus};
pub use message::{ChatMessage, MessageRole};
pub use session::{AgentSession, SessionManager, TurnGuard, DEFAULT_SESSION_ID};
pub use store::ResultStore;
