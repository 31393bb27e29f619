//! OpenAI-compatible streaming chat client

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::agent::{AgentSettings, ChatAgent, ChatRequest, FragmentStream};
use crate::error::{Result, RunnerError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    message: String,
}

/// One parsed server-sent event
#[derive(Debug, PartialEq, Eq)]
enum SseData {
    Fragment(String),
    Done,
    Skip,
}

pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    settings: AgentSettings,
}

impl OpenAiClient {
    /// Build a client; stalled replies are bounded by `settings.reply_timeout`
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        settings: AgentSettings,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(settings.reply_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            settings,
        })
    }
}

#[async_trait]
impl ChatAgent for OpenAiClient {
    fn name(&self) -> &str {
        &self.settings.model
    }

    async fn stream_reply(&self, request: ChatRequest) -> Result<FragmentStream> {
        let body = CompletionRequest {
            model: &self.settings.model,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            stream: true,
        };

        let url = format!("{}/chat/completions", self.base_url);
        info!("Sending {} messages to {}", request.messages.len(), url);

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RunnerError::agent(format!("Failed to connect to agent: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let error_text = res.text().await.unwrap_or_default();
            return Err(RunnerError::agent(format!(
                "Agent returned {}: {}",
                status, error_text
            )));
        }

        let (tx, rx) = mpsc::channel(64);
        let mut stream = res.bytes_stream();

        tokio::spawn(async move {
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(item) = stream.next().await {
                let chunk: bytes::Bytes = match item {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(Err(RunnerError::stream(e.to_string()))).await;
                        return;
                    }
                };

                for event in drain_events(&mut buffer, &chunk) {
                    match parse_event(&event) {
                        Ok(SseData::Fragment(text)) => {
                            if tx.send(Ok(text)).await.is_err() {
                                return; // Receiver dropped
                            }
                        }
                        Ok(SseData::Done) => return,
                        Ok(SseData::Skip) => {}
                        Err(e) => {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                }
            }

            let rest = String::from_utf8_lossy(&buffer);
            if !rest.trim().is_empty() {
                warn!("Stream ended with unparsed data: {}", rest.trim());
            }
        });

        Ok(ReceiverStream::new(rx).boxed())
    }
}

/// Append `chunk` and remove every complete `\n\n`-terminated event
///
/// Works on bytes so a character split across chunks is decoded whole.
/// Carriage returns are dropped, which turns CRLF framing into LF.
fn drain_events(buffer: &mut Vec<u8>, chunk: &[u8]) -> Vec<String> {
    buffer.extend(chunk.iter().copied().filter(|&b| b != b'\r'));

    let mut events = Vec::new();
    while let Some(idx) = buffer.windows(2).position(|w| w == b"\n\n") {
        let raw: Vec<u8> = buffer.drain(..idx + 2).collect();
        let event = String::from_utf8_lossy(&raw);
        let event = event.trim();
        if !event.is_empty() {
            events.push(event.to_string());
        }
    }
    events
}

/// Interpret one event's `data:` payload
fn parse_event(event: &str) -> Result<SseData> {
    let mut data = String::new();
    for line in event.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            data.push_str(rest.trim_start());
        }
    }

    if data.is_empty() {
        return Ok(SseData::Skip);
    }
    if data == "[DONE]" {
        return Ok(SseData::Done);
    }

    let chunk: CompletionChunk = serde_json::from_str(&data)?;
    if let Some(error) = chunk.error {
        return Err(RunnerError::stream(error.message));
    }

    let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|c| c.delta.content)
        .collect();

    if text.is_empty() {
        debug!("Skipping event without content");
        Ok(SseData::Skip)
    } else {
        Ok(SseData::Fragment(text))
    }
}
