//! Job executor - runs agent turns in the background
//!
//! Submitting a message returns a job id at once. The turn itself runs on a
//! spawned task that publishes growing snapshots to the [`ResultStore`].

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::agent::FragmentStream;
use crate::error::RunnerError;
use crate::job::JobSnapshot;
use crate::session::{AgentSession, SessionManager};
use crate::store::ResultStore;

/// Spawns one background job per submitted message
#[derive(Clone)]
pub struct JobExecutor {
    sessions: Arc<SessionManager>,
    results: Arc<ResultStore>,
}

impl JobExecutor {
    pub fn new(sessions: Arc<SessionManager>, results: Arc<ResultStore>) -> Self {
        Self { sessions, results }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn results(&self) -> &Arc<ResultStore> {
        &self.results
    }

    /// Queue `content` as the next user turn of `session_id`
    ///
    /// Returns the job id without waiting for the reply.
    pub async fn submit(&self, session_id: &str, content: String) -> String {
        let job_id = Uuid::new_v4().to_string();
        self.results
            .put(&job_id, JobSnapshot::running(String::new()))
            .await;

        let session = self.sessions.session(session_id).await;
        info!("Job {} submitted to session {}", job_id, session.id);

        let results = Arc::clone(&self.results);
        let idle_timeout = self.sessions.settings().reply_timeout;
        let id = job_id.clone();
        tokio::spawn(async move {
            run_turn(&id, session, content, &results, idle_timeout).await;
        });

        job_id
    }
}

/// One full turn: append, generate, drain, record
async fn run_turn(
    job_id: &str,
    session: Arc<AgentSession>,
    content: String,
    results: &ResultStore,
    idle_timeout: Duration,
) {
    let (fragments, turn) = match session.start_turn(content).await {
        Ok(started) => started,
        Err(e) => {
            error!("Job {} could not start: {}", job_id, e);
            results
                .put(job_id, JobSnapshot::failed(String::new(), e.to_string()))
                .await;
            return;
        }
    };

    let last = run(job_id, fragments, results, idle_timeout).await;

    if !last.message.is_empty() {
        session.record_reply(&turn, last.message).await;
    }
}

/// Drain `fragments`, publishing the accumulated text after each one
///
/// Ends with a `completed` snapshot, or `failed` with the partial text if the
/// stream errors or stays silent for `idle_timeout`. Never retries. Returns
/// the final snapshot.
pub async fn run(
    job_id: &str,
    mut fragments: FragmentStream,
    results: &ResultStore,
    idle_timeout: Duration,
) -> JobSnapshot {
    let mut accumulated = String::new();

    loop {
        let next = match tokio::time::timeout(idle_timeout, fragments.next()).await {
            Ok(Some(next)) => next,
            Ok(None) => break,
            Err(_) => Err(RunnerError::Timeout {
                after: idle_timeout,
            }),
        };

        match next {
            Ok(fragment) => {
                accumulated.push_str(&fragment);
                results
                    .put(job_id, JobSnapshot::running(accumulated.clone()))
                    .await;
            }
            Err(e) => {
                error!(
                    "Job {} failed after {} bytes: {}",
                    job_id,
                    accumulated.len(),
                    e
                );
                let snapshot = JobSnapshot::failed(accumulated, e.to_string());
                results.put(job_id, snapshot.clone()).await;
                return snapshot;
            }
        }
    }

    debug!("Job {} completed with {} bytes", job_id, accumulated.len());
    let snapshot = JobSnapshot::completed(accumulated);
    results.put(job_id, snapshot.clone()).await;
    snapshot
}
