//! In-memory job registry.
//!
//! The registry is the single source of truth for job state. All access goes
//! through one async `RwLock`, so every write is visible to any read that
//! starts after it.

use crate::error::{JobError, Result};
use crate::types::{Job, JobId, JobState, Status};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A single legal state change
#[derive(Clone, Debug)]
pub enum Transition {
    /// `queued → downloading`
    Start,
    /// `downloading → done`
    Complete {
        /// Absolute path of the produced file
        output_path: PathBuf,
        /// Produced file name without extension
        title: String,
    },
    /// `downloading → error`
    Fail {
        /// Human-readable failure cause
        message: String,
    },
}

impl Transition {
    /// Status this transition leads to
    pub fn target(&self) -> Status {
        match self {
            Transition::Start => Status::Downloading,
            Transition::Complete { .. } => Status::Done,
            Transition::Fail { .. } => Status::Error,
        }
    }

    fn into_state(self) -> JobState {
        match self {
            Transition::Start => JobState::Downloading,
            Transition::Complete { output_path, title } => JobState::Done { output_path, title },
            Transition::Fail { message } => JobState::Error { message },
        }
    }
}

/// Concurrency-safe map from job identifier to job record (cheap to clone)
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl JobRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new queued job under a freshly generated identifier
    pub async fn create(&self, url: impl Into<String>, format: impl Into<String>) -> JobId {
        let url = url.into();
        let format = format.into();
        let mut jobs = self.jobs.write().await;
        loop {
            let id = JobId::generate();
            if let Entry::Vacant(slot) = jobs.entry(id.clone()) {
                slot.insert(Job::new(id.clone(), url, format));
                return id;
            }
            tracing::warn!(job_id = %id, "Generated job id collided, retrying");
        }
    }

    /// Snapshot of a job's current state
    pub async fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Apply one transition to one job and return the new snapshot
    ///
    /// # Errors
    ///
    /// - [`JobError::NotFound`] if the identifier is unknown
    /// - [`JobError::InvalidTransition`] if the lifecycle does not allow the move
    pub async fn update(&self, id: &JobId, transition: Transition) -> Result<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(id).ok_or_else(|| JobError::NotFound {
            id: id.to_string(),
        })?;

        let from = job.status();
        let to = transition.target();
        if !from.can_transition_to(to) {
            return Err(JobError::InvalidTransition {
                id: id.to_string(),
                from,
                to,
            }
            .into());
        }

        job.state = transition.into_state();
        tracing::debug!(job_id = %id, %from, %to, "Job transitioned");
        Ok(job.clone())
    }

    /// Number of jobs held
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Whether no job has been submitted yet
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
