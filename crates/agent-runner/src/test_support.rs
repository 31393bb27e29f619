//! Scriptable agents for tests

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;

use crate::agent::{ChatAgent, ChatRequest, FragmentStream};
use crate::error::{Result, RunnerError};

type FragmentSender = mpsc::Sender<Result<String>>;

/// Agent whose fragments are pushed by the test
pub struct ChannelAgent {
    senders: mpsc::UnboundedSender<FragmentSender>,
}

/// Test side of a [`ChannelAgent`]
pub struct ChannelFeed {
    senders: Mutex<mpsc::UnboundedReceiver<FragmentSender>>,
}

impl ChannelAgent {
    pub fn new() -> (Self, ChannelFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self { senders: tx },
            ChannelFeed {
                senders: Mutex::new(rx),
            },
        )
    }
}

impl ChannelFeed {
    /// Wait for the next reply to start and take its fragment sender
    ///
    /// Dropping the sender ends the reply.
    pub async fn sender(&self) -> FragmentSender {
        self.senders
            .lock()
            .await
            .recv()
            .await
            .expect("agent dropped")
    }
}

#[async_trait]
impl ChatAgent for ChannelAgent {
    fn name(&self) -> &str {
        "channel"
    }

    async fn stream_reply(&self, _request: ChatRequest) -> Result<FragmentStream> {
        let (tx, rx) = mpsc::channel(16);
        self.senders
            .send(tx)
            .map_err(|_| RunnerError::agent("feed dropped"))?;
        Ok(ReceiverStream::new(rx).boxed())
    }
}

/// Agent that refuses every request
pub struct FailingAgent;

#[async_trait]
impl ChatAgent for FailingAgent {
    fn name(&self) -> &str {
        "failing"
    }

    async fn stream_reply(&self, _request: ChatRequest) -> Result<FragmentStream> {
        Err(RunnerError::agent("upstream unavailable"))
    }
}

/// Agent that never starts replying
pub struct HangingAgent;

#[async_trait]
impl ChatAgent for HangingAgent {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn stream_reply(&self, _request: ChatRequest) -> Result<FragmentStream> {
        futures::future::pending().await
    }
}
