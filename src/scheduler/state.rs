//! Shared scheduler state: the job table and the progress/ETA computation
//! read from it.

use crate::scheduler::job::{JobId, JobRecord, JobStatus};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub running: usize,
    pub queued: usize,
    pub percentage: f64,
    pub elapsed: Duration,
    pub eta: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct SchedulerState {
    jobs: Mutex<HashMap<JobId, JobRecord>>,
    batch_started_at: Mutex<Option<Instant>>,
}

impl SchedulerState {
    pub fn submit(&self, record: JobRecord) {
        let mut started = self.batch_started_at.lock().unwrap();
        if started.is_none() {
            *started = Some(Instant::now());
        }
        self.jobs.lock().unwrap().insert(record.id.clone(), record);
    }

    pub fn start(&self, id: &JobId) {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(id) {
            job.start();
        }
    }

    pub fn complete(&self, id: &JobId) {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(id) {
            job.complete();
        }
    }

    pub fn fail(&self, id: &JobId, error: String) {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(id) {
            job.fail(error);
        }
    }

    pub fn cancel(&self, id: &JobId) -> bool {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.get_mut(id) {
            Some(job) if !job.status.is_terminal() => {
                job.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn status(&self, id: &JobId) -> Option<JobStatus> {
        self.jobs.lock().unwrap().get(id).map(|j| j.status.clone())
    }

    pub fn snapshot(&self) -> Vec<JobRecord> {
        self.jobs.lock().unwrap().values().cloned().collect()
    }

    /// `eta` is the average execution time of jobs that have already
    /// completed, multiplied by the still-queued count, divided by the
    /// number of jobs currently in flight (the instantaneous worker count).
    pub fn progress(&self) -> Progress {
        let jobs = self.jobs.lock().unwrap();
        let total = jobs.len();
        let mut completed = 0;
        let mut failed = 0;
        let mut running = 0;
        let mut queued = 0;
        let mut finished_durations = Vec::new();

        for job in jobs.values() {
            match job.status {
                JobStatus::Completed => {
                    completed += 1;
                    if let Some(d) = job.execution_time {
                        finished_durations.push(d);
                    }
                }
                JobStatus::Failed => failed += 1,
                JobStatus::Running => running += 1,
                JobStatus::Queued => queued += 1,
                JobStatus::Cancelled => {}
            }
        }
        drop(jobs);

        let elapsed = self.batch_started_at.lock().unwrap().map(|s| s.elapsed()).unwrap_or_default();
        let percentage = if total == 0 { 0.0 } else { (completed + failed) as f64 / total as f64 * 100.0 };

        let eta = if queued > 0 && !finished_durations.is_empty() && running > 0 {
            let avg = finished_durations.iter().sum::<Duration>() / finished_durations.len() as u32;
            Some(Duration::from_secs_f64(avg.as_secs_f64() * queued as f64 / running as f64))
        } else {
            None
        };

        Progress { total, completed, failed, running, queued, percentage, elapsed, eta }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn progress_reflects_mixed_job_states() {
        let state = SchedulerState::default();
        state.submit(JobRecord::queued(JobId::new("a"), PathBuf::from("a.py"), "python"));
        state.submit(JobRecord::queued(JobId::new("b"), PathBuf::from("b.py"), "python"));
        state.start(&JobId::new("a"));
        state.complete(&JobId::new("a"));

        let progress = state.progress();
        assert_eq!(progress.total, 2);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.queued, 1);
        assert_eq!(progress.percentage, 50.0);
    }

    #[test]
    fn cancel_only_applies_to_non_terminal_jobs() {
        let state = SchedulerState::default();
        state.submit(JobRecord::queued(JobId::new("a"), PathBuf::from("a.py"), "python"));
        state.start(&JobId::new("a"));
        state.complete(&JobId::new("a"));
        assert!(!state.cancel(&JobId::new("a")));

        state.submit(JobRecord::queued(JobId::new("b"), PathBuf::from("b.py"), "python"));
        assert!(state.cancel(&JobId::new("b")));
        assert_eq!(state.status(&JobId::new("b")), Some(JobStatus::Cancelled));
    }
}
