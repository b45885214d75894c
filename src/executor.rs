//! Job execution: one background task per job.
//!
//! The executor is the failure boundary of a job. Whatever the downloader
//! does (returns an error, produces nothing usable, panics), the outcome ends
//! up in the job record and never reaches the caller or any other job.

use crate::error::{Error, FetchError, JobError, Result};
use crate::media::{FetchRequest, MediaFetcher};
use crate::registry::{JobRegistry, Transition};
use crate::types::{Event, Job, JobId};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::task::TaskTracker;

/// Dispatches downloads and records their outcome in the registry
#[derive(Clone)]
pub struct JobExecutor {
    registry: JobRegistry,
    fetcher: Arc<dyn MediaFetcher>,
    download_dir: PathBuf,
    event_tx: broadcast::Sender<Event>,
    tasks: TaskTracker,
}

/// What a successful run produced
struct Produced {
    output_path: PathBuf,
    title: String,
}

impl JobExecutor {
    /// Create an executor writing into `download_dir/<job id>`
    pub fn new(
        registry: JobRegistry,
        fetcher: Arc<dyn MediaFetcher>,
        download_dir: PathBuf,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            registry,
            fetcher,
            download_dir,
            event_tx,
            tasks: TaskTracker::new(),
        }
    }

    /// Spawn the job in the background and return immediately
    pub fn dispatch(&self, id: JobId) {
        let executor = self.clone();
        self.tasks.spawn(async move { executor.execute(id).await });
    }

    /// Directory owned exclusively by `id`
    pub fn job_dir(&self, id: &JobId) -> PathBuf {
        self.download_dir.join(id.as_str())
    }

    /// Number of jobs currently running
    pub fn running(&self) -> usize {
        self.tasks.len()
    }

    /// Name of the downloader backend
    pub fn fetcher_name(&self) -> &'static str {
        self.fetcher.name()
    }

    /// Whether the downloader backend can fetch anything
    pub fn fetcher_available(&self) -> bool {
        self.fetcher.is_available()
    }

    /// Run one job to its terminal state
    ///
    /// Never returns an error: every failure is recorded on the job.
    pub async fn execute(&self, id: JobId) {
        let job = match self.registry.update(&id, Transition::Start).await {
            Ok(job) => job,
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "Cannot start job");
                return;
            }
        };
        self.emit_event(Event::Downloading { id: id.clone() });
        tracing::info!(job_id = %id, url = %job.url, format = %job.format, "Job started");

        let outcome = match AssertUnwindSafe(self.run(&job)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(FetchError::Panicked(panic_message(panic.as_ref())).into()),
        };

        match outcome {
            Ok(produced) => {
                let path = produced.output_path.clone();
                let title = produced.title.clone();
                let transition = Transition::Complete {
                    output_path: produced.output_path,
                    title: produced.title,
                };
                match self.registry.update(&id, transition).await {
                    Ok(_) => {
                        tracing::info!(job_id = %id, path = %path.display(), "Job done");
                        self.emit_event(Event::Completed { id, path, title });
                    }
                    Err(e) => tracing::error!(job_id = %id, error = %e, "Failed to record job result"),
                }
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(job_id = %id, error = %message, "Job failed");
                let transition = Transition::Fail {
                    message: message.clone(),
                };
                match self.registry.update(&id, transition).await {
                    Ok(_) => self.emit_event(Event::Failed { id, error: message }),
                    Err(e) => tracing::error!(job_id = %id, error = %e, "Failed to record job failure"),
                }
            }
        }
    }

    async fn run(&self, job: &Job) -> Result<Produced> {
        let job_dir = self.job_dir(&job.id);
        tokio::fs::create_dir_all(&job_dir).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to create job directory '{}': {}", job_dir.display(), e),
            ))
        })?;

        let request = FetchRequest {
            output_dir: job_dir.clone(),
            url: job.url.clone(),
            audio_only: job.is_audio(),
        };
        let media = self.fetcher.fetch(&request).await?;

        let output_path = resolve_inside(&job.id, &job_dir, &media.path).await?;
        let title = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Other(format!("produced file has no name: {}", output_path.display())))?;

        Ok(Produced { output_path, title })
    }

    /// Stop accepting work and wait for running jobs, up to `timeout`
    ///
    /// Returns `true` if every job finished in time. Jobs still running keep
    /// running; they are not aborted.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        self.tasks.close();
        tokio::time::timeout(timeout, self.tasks.wait()).await.is_ok()
    }

    fn emit_event(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}

/// Canonicalize `produced` and require it to sit inside `job_dir`
async fn resolve_inside(id: &JobId, job_dir: &Path, produced: &Path) -> Result<PathBuf> {
    let candidate = if produced.is_absolute() {
        produced.to_path_buf()
    } else {
        job_dir.join(produced)
    };

    let resolved = tokio::fs::canonicalize(&candidate).await.map_err(|_| {
        FetchError::OutputNotFound {
            title: candidate
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    })?;
    let root = tokio::fs::canonicalize(job_dir).await?;

    if !resolved.starts_with(&root) {
        return Err(JobError::OutputOutsideJobDir {
            id: id.to_string(),
            path: resolved,
        }
        .into());
    }
    if !tokio::fs::metadata(&resolved).await?.is_file() {
        return Err(FetchError::OutputNotFound {
            title: resolved.display().to_string(),
        }
        .into());
    }
    Ok(resolved)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
