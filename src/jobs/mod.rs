use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

pub mod runner;

pub use runner::JobRunner;

/// Lifecycle of an extraction job.
///
/// `queued → processing → {completed | failed}`; the last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// One asynchronous request to acquire a stream and convert it to MP3.
///
/// Serialized in camelCase to preserve the wire contract the browser
/// extension expects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub stream_url: String,
    pub video_id: Option<String>,
    pub delivery_param: Option<String>,
    pub delivery_response: Option<serde_json::Value>,
    pub status: JobStatus,
    pub error: Option<String>,
    pub output_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(
        stream_url: String,
        video_id: Option<String>,
        delivery_param: Option<String>,
        delivery_response: Option<serde_json::Value>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            stream_url,
            video_id,
            delivery_param,
            delivery_response,
            status: JobStatus::Queued,
            error: None,
            output_path: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Move to a new status, refusing to leave a terminal state
    pub fn transition(&mut self, status: JobStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = status;
        self.touch();
        true
    }

    pub fn mark_processing(&mut self) -> bool {
        self.transition(JobStatus::Processing)
    }

    pub fn mark_completed(&mut self) -> bool {
        if !self.transition(JobStatus::Completed) {
            return false;
        }
        self.completed_at = Some(Utc::now());
        true
    }

    /// Remember where the artifact will land once conversion succeeds
    pub fn record_output_path(&mut self, path: PathBuf) {
        self.output_path = Some(path);
        self.touch();
    }

    pub fn mark_failed(&mut self, error: String) -> bool {
        if !self.transition(JobStatus::Failed) {
            return false;
        }
        self.error = Some(error);
        true
    }
}

/// The sole cross-request mutable state: job id → job record.
///
/// An explicit, injectable handle (no globals) so each test can own an
/// isolated registry. Jobs persist for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Job>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: Job) {
        self.inner
            .write()
            .expect("job registry poisoned")
            .insert(job.id, job);
    }

    pub fn get(&self, id: Uuid) -> Option<Job> {
        self.inner
            .read()
            .expect("job registry poisoned")
            .get(&id)
            .cloned()
    }

    pub fn all(&self) -> Vec<Job> {
        self.inner
            .read()
            .expect("job registry poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Mutate a job in place, returning the updated copy
    pub fn update<F>(&self, id: Uuid, f: F) -> Option<Job>
    where
        F: FnOnce(&mut Job),
    {
        self.inner
            .write()
            .expect("job registry poisoned")
            .get_mut(&id)
            .map(|job| {
                f(job);
                job.clone()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new("https://cdn.example.com/video.mp4".into(), None, None, None)
    }

    #[test]
    fn test_new_job_starts_queued() {
        let job = job();
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.error.is_none());
        assert!(job.output_path.is_none());
        assert!(job.completed_at.is_none());
        assert_eq!(job.created_at, job.updated_at);
    }

    #[test]
    fn test_terminal_states_never_regress() {
        let mut job = job();
        assert!(job.mark_processing());
        assert!(job.mark_completed());
        assert!(!job.transition(JobStatus::Queued));
        assert!(!job.mark_failed("late".into()));
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.error.is_none());

        let mut job = self::job();
        assert!(job.mark_failed("ffmpeg exited with code 1".into()));
        assert!(!job.mark_completed());
        assert_eq!(job.status, JobStatus::Failed);
    }

    #[test]
    fn test_registry_insert_get_update() {
        let registry = JobRegistry::new();
        let job = job();
        let id = job.id;
        registry.insert(job);

        assert!(registry.get(id).is_some());
        assert!(registry.get(Uuid::new_v4()).is_none());
        assert_eq!(registry.all().len(), 1);

        let updated = registry.update(id, |j| {
            j.mark_processing();
        });
        assert_eq!(updated.unwrap().status, JobStatus::Processing);
        assert_eq!(registry.get(id).unwrap().status, JobStatus::Processing);
    }

    #[test]
    fn test_wire_format_is_camel_case_with_lowercase_status() {
        let value = serde_json::to_value(job()).unwrap();
        assert_eq!(value["status"], "queued");
        assert!(value.get("streamUrl").is_some());
        assert!(value.get("outputPath").is_some());
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["error"], serde_json::Value::Null);
    }
}
