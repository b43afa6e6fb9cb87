//! Per-job lifecycle state: `Queued -> Running -> {Completed | Failed | Cancelled}`.

use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }
}

/// A `(file_path, language, parse_fn)` tuple plus the bookkeeping fields
/// the scheduler mutates as the job moves through its lifecycle.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: JobId,
    pub file_path: PathBuf,
    pub language_tag: String,
    pub status: JobStatus,
    pub started_at: Option<Instant>,
    pub completed_at: Option<Instant>,
    pub execution_time: Option<Duration>,
    pub error: Option<String>,
}

impl JobRecord {
    pub fn queued(id: JobId, file_path: PathBuf, language_tag: impl Into<String>) -> Self {
        Self {
            id,
            file_path,
            language_tag: language_tag.into(),
            status: JobStatus::Queued,
            started_at: None,
            completed_at: None,
            execution_time: None,
            error: None,
        }
    }

    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.started_at = Some(Instant::now());
    }

    pub fn complete(&mut self) {
        let now = Instant::now();
        self.execution_time = self.started_at.map(|s| now.duration_since(s));
        self.completed_at = Some(now);
        self.status = JobStatus::Completed;
    }

    pub fn fail(&mut self, error: String) {
        let now = Instant::now();
        self.execution_time = self.started_at.map(|s| now.duration_since(s));
        self.completed_at = Some(now);
        self.status = JobStatus::Failed;
        self.error = Some(error);
    }

    pub fn cancel(&mut self) {
        self.completed_at = Some(Instant::now());
        self.status = JobStatus::Cancelled;
    }
}
