//! Version registry
//!
//! In-memory authority for which prompt version is active in each environment
//! and for the evaluation scores that gate promotion to production.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::evaluator::{Evaluator, TOTAL_FIXTURES};
use super::model::{ActiveVersions, Environment, EvalReport, EvalSummary};
use crate::error::Error;
use crate::prompt::PromptRepository;
use crate::Result;

/// Role under which an activated staging prompt is installed
pub const SYSTEM_ROLE: &str = "system";

/// Receives the instruction text of a newly staged prompt
#[async_trait]
pub trait InstructionSink: Send + Sync {
    async fn apply_system_instruction(&self, text: &str, role: &str);
}

#[derive(Debug, Default)]
struct RegistryState {
    active: ActiveVersions,
    scores: HashMap<String, f64>,
}

impl RegistryState {
    fn active_score(&self, environment: Environment) -> f64 {
        self.active
            .get(environment)
            .and_then(|version| self.scores.get(version))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Tracks active versions and scores, and enforces the promotion gate
pub struct VersionRegistry {
    prompts: Arc<dyn PromptRepository>,
    evaluator: Arc<dyn Evaluator>,
    sink: Arc<dyn InstructionSink>,
    state: RwLock<RegistryState>,
    /// Held from pointer update to instruction push so activations apply in order
    activation: Mutex<()>,
}

impl VersionRegistry {
    pub fn new(
        prompts: Arc<dyn PromptRepository>,
        evaluator: Arc<dyn Evaluator>,
        sink: Arc<dyn InstructionSink>,
    ) -> Self {
        Self {
            prompts,
            evaluator,
            sink,
            state: RwLock::new(RegistryState::default()),
            activation: Mutex::new(()),
        }
    }

    /// Snapshot of the active versions
    pub async fn active(&self) -> ActiveVersions {
        self.state.read().await.active.clone()
    }

    /// Snapshot of all recorded scores
    pub async fn scores(&self) -> HashMap<String, f64> {
        self.state.read().await.scores.clone()
    }

    /// Point `environment` at `version`
    ///
    /// Activating a staging version installs its prompt as the agent's system
    /// instruction. An unknown version still moves the pointer.
    pub async fn set_active(
        &self,
        environment: &str,
        version: Option<String>,
    ) -> Result<(Environment, Option<String>)> {
        let environment: Environment = environment.parse()?;
        let version = version
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let _activation = self.activation.lock().await;
        self.state
            .write()
            .await
            .active
            .set(environment, version.clone());
        info!("Active {} version set to {:?}", environment, version);

        if let (Environment::Staging, Some(v)) = (environment, version.as_deref()) {
            match self.prompts.get(v).await {
                Ok(Some(doc)) => {
                    self.sink
                        .apply_system_instruction(&doc.prompt, SYSTEM_ROLE)
                        .await;
                }
                Ok(None) => warn!("Staged version {} has no prompt document", v),
                Err(e) => warn!("Failed to resolve staged version {}: {}", v, e),
            }
        }

        Ok((environment, version))
    }

    /// Evaluate `version` and record its score, replacing any earlier one
    pub async fn record_eval_score(&self, version: &str) -> EvalReport {
        let score = self.evaluator.evaluate(version);
        self.state
            .write()
            .await
            .scores
            .insert(version.to_string(), score);
        info!("Recorded eval score {} for {}", score, version);

        let prompt_name = match self.prompts.get(version).await {
            Ok(Some(doc)) => doc.name,
            _ => format!("Prompt {}", version),
        };

        EvalReport {
            version: version.to_string(),
            score,
            summary: EvalSummary {
                prompt_name,
                prompt_version: version.to_string(),
                average_score: score,
                total_fixtures: TOTAL_FIXTURES,
                results: Vec::new(),
            },
        }
    }

    /// Make `version` the production version
    ///
    /// Allowed only while the active staging score is at least the active
    /// production score. The scores compared are those of the active
    /// versions, not of `version`; a missing score counts as zero.
    pub async fn promote(&self, version: &str) -> Result<()> {
        let mut state = self.state.write().await;

        let staging_score = state.active_score(Environment::Staging);
        let production_score = state.active_score(Environment::Production);
        if staging_score < production_score {
            warn!(
                "Promotion of {} blocked: staging {} < production {}",
                version, staging_score, production_score
            );
            return Err(Error::Gate {
                staging_score,
                production_score,
            });
        }

        state.active.production = Some(version.to_string());
        info!("Promoted {} to production", version);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::FilePromptStore;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSink {
        applied: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl InstructionSink for RecordingSink {
        async fn apply_system_instruction(&self, text: &str, role: &str) {
            self.applied
                .lock()
                .unwrap()
                .push((text.to_string(), role.to_string()));
        }
    }

    struct FixedScores(HashMap<&'static str, f64>);

    impl Evaluator for FixedScores {
        fn evaluate(&self, version: &str) -> f64 {
            self.0.get(version).copied().unwrap_or(0.0)
        }
    }

    fn build_registry(
        scores: &[(&'static str, f64)],
    ) -> (VersionRegistry, Arc<FilePromptStore>, Arc<RecordingSink>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(FilePromptStore::new(temp_dir.path().join("prompts")));
        let sink = Arc::new(RecordingSink::default());
        let registry = VersionRegistry::new(
            store.clone(),
            Arc::new(FixedScores(scores.iter().copied().collect())),
            sink.clone(),
        );
        (registry, store, sink, temp_dir)
    }

    #[tokio::test]
    async fn test_set_active_rejects_unknown_environment() {
        let (registry, _store, _sink, _temp) = build_registry(&[]);

        let result = registry.set_active("qa", Some("v1".to_string())).await;
        assert!(matches!(result, Err(Error::InvalidEnvironment(_))));
        assert_eq!(registry.active().await, ActiveVersions::default());
    }

    #[tokio::test]
    async fn test_staging_activation_pushes_stored_prompt() {
        let (registry, store, sink, _temp) = build_registry(&[]);
        let doc = store.create("Pirate", "Talk like a pirate.", None).await.unwrap();

        registry
            .set_active("staging", Some(doc.version.clone()))
            .await
            .unwrap();

        assert_eq!(registry.active().await.staging, Some(doc.version));
        let applied = sink.applied.lock().unwrap().clone();
        assert_eq!(
            applied,
            vec![("Talk like a pirate.".to_string(), "system".to_string())]
        );
    }

    #[tokio::test]
    async fn test_staging_activation_falls_back_to_seed() {
        let (registry, _store, sink, _temp) = build_registry(&[]);

        registry.set_active("staging", Some("v5".to_string())).await.unwrap();

        let applied = sink.applied.lock().unwrap().clone();
        assert_eq!(applied.len(), 1);
        assert!(applied[0].0.starts_with("You are an expert code reviewer."));
    }

    #[tokio::test]
    async fn test_unknown_staging_version_moves_pointer_only() {
        let (registry, _store, sink, _temp) = build_registry(&[]);

        registry.set_active("staging", Some("v404".to_string())).await.unwrap();

        assert_eq!(registry.active().await.staging.as_deref(), Some("v404"));
        assert!(sink.applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_production_activation_does_not_push() {
        let (registry, _store, sink, _temp) = build_registry(&[]);

        let (env, version) = registry.set_active("prod", Some("v2".to_string())).await.unwrap();

        assert_eq!(env, Environment::Production);
        assert_eq!(version.as_deref(), Some("v2"));
        assert_eq!(registry.active().await.production.as_deref(), Some("v2"));
        assert!(sink.applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clearing_slot() {
        let (registry, _store, sink, _temp) = build_registry(&[]);

        registry.set_active("staging", Some("v1".to_string())).await.unwrap();
        registry.set_active("staging", None).await.unwrap();

        assert_eq!(registry.active().await.staging, None);
        assert_eq!(sink.applied.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_eval_score_overwrites() {
        let (registry, _store, _sink, _temp) = build_registry(&[("v3", 88.0)]);

        let report = registry.record_eval_score("v3").await;
        assert_eq!(report.score, 88.0);
        assert_eq!(report.summary.prompt_name, "Creative Writer");
        assert_eq!(report.summary.total_fixtures, 10);

        registry.record_eval_score("v3").await;
        assert_eq!(registry.scores().await.len(), 1);

        let report = registry.record_eval_score("v500").await;
        assert_eq!(report.summary.prompt_name, "Prompt v500");
    }

    #[tokio::test]
    async fn test_promote_succeeds_when_staging_scores_higher() {
        let (registry, _store, _sink, _temp) = build_registry(&[("v2", 80.0), ("v1", 60.0)]);
        registry.set_active("staging", Some("v2".to_string())).await.unwrap();
        registry.set_active("production", Some("v1".to_string())).await.unwrap();
        registry.record_eval_score("v2").await;
        registry.record_eval_score("v1").await;

        registry.promote("v2").await.unwrap();
        assert_eq!(registry.active().await.production.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_promote_blocked_when_staging_scores_lower() {
        let (registry, _store, _sink, _temp) = build_registry(&[("v2", 50.0), ("v1", 70.0)]);
        registry.set_active("staging", Some("v2".to_string())).await.unwrap();
        registry.set_active("production", Some("v1".to_string())).await.unwrap();
        registry.record_eval_score("v2").await;
        registry.record_eval_score("v1").await;

        let result = registry.promote("v2").await;
        match result {
            Err(Error::Gate {
                staging_score,
                production_score,
            }) => {
                assert_eq!(staging_score, 50.0);
                assert_eq!(production_score, 70.0);
            }
            other => panic!("Expected Gate error, got: {:?}", other),
        }
        assert_eq!(registry.active().await.production.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_promote_with_no_scores_passes() {
        let (registry, _store, _sink, _temp) = build_registry(&[]);

        registry.promote("v7").await.unwrap();
        assert_eq!(registry.active().await.production.as_deref(), Some("v7"));
    }

    #[tokio::test]
    async fn test_promote_compares_active_scores_not_target() {
        // v9 itself scores low, but the gate only looks at the active pair
        let (registry, _store, _sink, _temp) =
            build_registry(&[("v2", 90.0), ("v1", 70.0), ("v9", 10.0)]);
        registry.set_active("staging", Some("v2".to_string())).await.unwrap();
        registry.set_active("production", Some("v1".to_string())).await.unwrap();
        for v in ["v1", "v2", "v9"] {
            registry.record_eval_score(v).await;
        }

        registry.promote("v9").await.unwrap();
        assert_eq!(registry.active().await.production.as_deref(), Some("v9"));
    }

    #[tokio::test]
    async fn test_unscored_production_counts_as_zero() {
        let (registry, _store, _sink, _temp) = build_registry(&[("v2", 0.0)]);
        registry.set_active("production", Some("v1".to_string())).await.unwrap();

        registry.promote("v2").await.unwrap();
    }

    /// Sink that takes a while to install one particular text
    struct SlowSink {
        slow_text: String,
        applied: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl InstructionSink for SlowSink {
        async fn apply_system_instruction(&self, text: &str, _role: &str) {
            if text == self.slow_text {
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
            self.applied.lock().unwrap().push(text.to_string());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_overlapping_activations_leave_last_instruction_installed() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(FilePromptStore::new(temp_dir.path().join("prompts")));
        let first = store.create("First", "First rules.", None).await.unwrap();
        let second = store.create("Second", "Second rules.", None).await.unwrap();
        let sink = Arc::new(SlowSink {
            slow_text: "First rules.".to_string(),
            applied: Mutex::new(Vec::new()),
        });
        let registry = Arc::new(VersionRegistry::new(
            store,
            Arc::new(FixedScores(HashMap::new())),
            sink.clone(),
        ));

        let earlier = {
            let registry = Arc::clone(&registry);
            let version = first.version.clone();
            tokio::spawn(async move { registry.set_active("staging", Some(version)).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        registry
            .set_active("staging", Some(second.version.clone()))
            .await
            .unwrap();
        earlier.await.unwrap().unwrap();

        assert_eq!(registry.active().await.staging, Some(second.version));
        let applied = sink.applied.lock().unwrap().clone();
        assert_eq!(applied, ["First rules.", "Second rules."]);
    }
}
