//! Application state

use std::sync::Arc;

use agent_runner::{ChatAgent, JobExecutor, ResultStore, SessionManager};
use pl_core::prompt::{FilePromptStore, PromptRepository};
use pl_core::registry::{DigestEvaluator, VersionRegistry};

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    prompts: Arc<FilePromptStore>,
    registry: VersionRegistry,
    sessions: Arc<SessionManager>,
    executor: JobExecutor,
}

impl AppState {
    /// Wire the stores, registry and executor around `agent`
    pub fn new(config: ServerConfig, agent: Arc<dyn ChatAgent>) -> Self {
        let prompts = Arc::new(FilePromptStore::new(config.data_dir.join("prompts")));
        let sessions = Arc::new(SessionManager::new(
            agent,
            config.agent.clone(),
            config.default_instruction.clone(),
        ));
        let registry = VersionRegistry::new(
            Arc::clone(&prompts) as Arc<dyn PromptRepository>,
            Arc::new(DigestEvaluator),
            Arc::clone(&sessions) as Arc<dyn pl_core::registry::InstructionSink>,
        );
        let executor = JobExecutor::new(Arc::clone(&sessions), Arc::new(ResultStore::new()));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                prompts,
                registry,
                sessions,
                executor,
            }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get reference to the prompt store
    pub fn prompts(&self) -> &FilePromptStore {
        &self.inner.prompts
    }

    pub fn registry(&self) -> &VersionRegistry {
        &self.inner.registry
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }

    pub fn executor(&self) -> &JobExecutor {
        &self.inner.executor
    }

    pub fn results(&self) -> &Arc<ResultStore> {
        self.inner.executor.results()
    }
}
