//! Job submission, lookup and result resolution.

use crate::error::{Error, JobError, Result};
use crate::types::{AUDIO_FORMAT, Event, Job, JobId, Status};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use super::DownloadService;

/// Non-empty trimmed lines of an uploaded URL list, in order
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_format(format: Option<&str>) -> String {
    match format.map(str::trim) {
        Some(f) if !f.is_empty() => f.to_lowercase(),
        _ => AUDIO_FORMAT.to_string(),
    }
}

impl DownloadService {
    /// Create a queued job and start it in the background
    ///
    /// `format` defaults to `"mp3"` (audio only) and is lower-cased. Returns
    /// as soon as the job is registered; the download runs concurrently.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if `url` is empty
    /// - [`Error::ShuttingDown`] once shutdown has begun
    pub async fn submit(&self, url: &str, format: Option<&str>) -> Result<JobId> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }
        self.enqueue(url, format).await
    }

    /// Submit one audio job per non-empty line of `content`
    ///
    /// An input without any URL yields an empty list. Shutdown is checked
    /// once up front, so a batch that starts is submitted in full and every
    /// created id is returned.
    pub async fn submit_batch(&self, content: &str) -> Result<Vec<JobId>> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let urls = parse_url_list(content);
        let mut ids = Vec::with_capacity(urls.len());
        for url in &urls {
            ids.push(self.enqueue(url, Some(AUDIO_FORMAT)).await?);
        }
        tracing::info!(count = ids.len(), "Batch submitted");
        Ok(ids)
    }

    async fn enqueue(&self, url: &str, format: Option<&str>) -> Result<JobId> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::Validation("Missing url".into()));
        }
        let format = normalize_format(format);

        let id = self.registry.create(url, format.as_str()).await;
        tracing::info!(job_id = %id, url, format = %format, "Job queued");
        self.emit_event(Event::Queued {
            id: id.clone(),
            url: url.to_string(),
        });

        self.executor.dispatch(id.clone());
        Ok(id)
    }

    /// Current snapshot of a job
    pub async fn job(&self, id: &JobId) -> Result<Job> {
        self.registry
            .get(id)
            .await
            .ok_or_else(|| {
                JobError::NotFound {
                    id: id.to_string(),
                }
                .into()
            })
    }

    /// Path of a finished job's file, checked to still exist
    ///
    /// # Errors
    ///
    /// - [`JobError::NotFound`] for an unknown job
    /// - [`JobError::NotReady`] unless the job is `done`
    /// - [`JobError::FileMissing`] if the file was removed from disk
    pub async fn result_file(&self, id: &JobId) -> Result<PathBuf> {
        let job = self.job(id).await?;
        let path = match (job.status(), job.output_path()) {
            (Status::Done, Some(path)) => path.clone(),
            (status, _) => {
                return Err(JobError::NotReady {
                    id: id.to_string(),
                    status,
                }
                .into());
            }
        };

        let exists = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !exists {
            tracing::warn!(job_id = %id, path = %path.display(), "Result file missing from disk");
            return Err(JobError::FileMissing {
                id: id.to_string(),
                path,
            }
            .into());
        }
        Ok(path)
    }
}
