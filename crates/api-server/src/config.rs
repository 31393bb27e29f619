//! Server configuration from environment variables

use std::path::PathBuf;
use std::time::Duration;

use agent_runner::{AgentSettings, DEFAULT_BASE_URL};
use pl_core::prompt::DEFAULT_INSTRUCTION;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_RETENTION_SECS: u64 = 3600;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub port: u16,
    /// Single allowed CORS origin; any origin when unset
    pub allowed_origin: Option<String>,
    pub result_retention: Duration,
    pub sweep_interval: Duration,
    pub api_key: Option<String>,
    pub base_url: String,
    pub offline: bool,
    pub agent: AgentSettings,
    pub default_instruction: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = AgentSettings::default();

        Self {
            data_dir: env_string("PL_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".pl-data")),
            port: env_parse("PL_PORT", DEFAULT_PORT),
            allowed_origin: env_string("PL_ALLOWED_ORIGIN"),
            result_retention: Duration::from_secs(env_parse(
                "PL_RESULT_RETENTION_SECS",
                DEFAULT_RETENTION_SECS,
            )),
            sweep_interval: Duration::from_secs(
                env_parse("PL_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS).max(1),
            ),
            api_key: env_string("OPENAI_API_KEY"),
            base_url: env_string("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            offline: env_flag("PL_OFFLINE", false),
            agent: AgentSettings {
                model: env_string("PL_MODEL").unwrap_or(defaults.model),
                temperature: env_parse("PL_TEMPERATURE", defaults.temperature),
                max_tokens: env_parse("PL_MAX_TOKENS", defaults.max_tokens),
                max_history_messages: env_parse("PL_MAX_HISTORY", defaults.max_history_messages),
                reply_timeout: Duration::from_secs(
                    env_parse("PL_REPLY_TIMEOUT_SECS", defaults.reply_timeout.as_secs()).max(1),
                ),
            },
            default_instruction: env_string("PL_DEFAULT_INSTRUCTION")
                .unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string()),
        }
    }

    /// Key to use for the upstream agent, unless running offline
    pub fn upstream_key(&self) -> Option<&str> {
        if self.offline {
            return None;
        }
        self.api_key.as_deref()
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env_string(name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}", name, raw);
            default
        }),
        None => default,
    }
}

pub fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
