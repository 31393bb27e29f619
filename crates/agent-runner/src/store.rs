//! In-memory result store
//!
//! Maps job ids to the latest snapshot. Each job has a single writer; any
//! number of pollers read concurrently. A snapshot is replaced as a whole.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::job::JobSnapshot;

#[derive(Debug)]
struct Entry {
    snapshot: JobSnapshot,
    /// Set when the snapshot turned terminal
    finished_at: Option<Instant>,
}

/// Job id -> latest snapshot
#[derive(Debug, Default)]
pub struct ResultStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a snapshot for `job_id`
    ///
    /// Returns false and leaves the entry alone if the job already finished.
    pub async fn put(&self, job_id: &str, snapshot: JobSnapshot) -> bool {
        let mut entries = self.entries.write().await;

        if let Some(existing) = entries.get(job_id) {
            if existing.snapshot.is_terminal() {
                warn!("Ignoring write to finished job {}", job_id);
                return false;
            }
        }

        let finished_at = snapshot.is_terminal().then(Instant::now);
        entries.insert(
            job_id.to_string(),
            Entry {
                snapshot,
                finished_at,
            },
        );
        true
    }

    /// Latest snapshot for `job_id`
    pub async fn get(&self, job_id: &str) -> Option<JobSnapshot> {
        let entries = self.entries.read().await;
        entries.get(job_id).map(|e| e.snapshot.clone())
    }

    /// Number of tracked jobs
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop finished jobs older than `retention`; running jobs are kept
    pub async fn evict_finished(&self, retention: Duration) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| match entry.finished_at {
            Some(at) => at.elapsed() < retention,
            None => true,
        });
        before - entries.len()
    }

    /// Periodically evict finished jobs in the background
    pub fn spawn_sweeper(self: Arc<Self>, retention: Duration, interval: Duration) -> JoinHandle<()> {
        info!(
            "Result sweeper started (retention {:?}, interval {:?})",
            retention, interval
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = self.evict_finished(retention).await;
                if evicted > 0 {
                    debug!("Evicted {} finished jobs", evicted);
                }
            }
        })
    }
}
