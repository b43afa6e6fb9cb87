//! Three execution modes over `(file_path, language, parse_fn)` jobs, each
//! reporting into the same `SchedulerState` so `get_progress()` and the
//! throughput definition in `BatchResult` agree regardless of mode.

use crate::scheduler::job::{JobId, JobRecord, JobStatus};
use crate::scheduler::state::{Progress, SchedulerState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub enum ExecutionMode {
    /// Straight loop; required when the ingestor sink is not process-safe.
    Inline,
    /// Fixed worker count via a scoped thread pool, for I/O-bound parsing.
    ThreadPool { workers: usize },
    /// Daemonized workers draining a shared queue via a dedicated tokio runtime.
    WorkerProcess { workers: usize },
}

#[derive(Debug)]
pub struct BatchResult {
    pub results: HashMap<JobId, serde_json::Value>,
    pub errors: HashMap<JobId, String>,
    pub total_time: Duration,
    /// `completed / elapsed`, elapsed measured from first submission to the
    /// last job leaving `Running`, for every execution mode.
    pub throughput: f64,
}

type ResultSink = Arc<Mutex<HashMap<JobId, serde_json::Value>>>;

pub struct ProcessManager {
    state: Arc<SchedulerState>,
    mode: ExecutionMode,
    shutdown_requested: Arc<AtomicBool>,
}

impl ProcessManager {
    pub fn new(mode: ExecutionMode) -> Self {
        Self {
            state: Arc::new(SchedulerState::default()),
            mode,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn progress(&self) -> Progress {
        self.state.progress()
    }

    pub fn cancel_job(&self, id: &JobId) -> bool {
        self.state.cancel(id)
    }

    /// Requests termination; `wait` blocks the caller until already-running
    /// jobs finish (queued jobs that haven't started are cancelled instead
    /// of dispatched). `timeout` bounds how long `wait` polls before giving up.
    pub fn shutdown(&self, wait: bool, timeout: Duration) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        if !wait {
            return;
        }
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.state.progress().running == 0 {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// Submits every job, runs them to completion under this manager's
    /// execution mode, and returns the aggregated `BatchResult`.
    pub fn run_batch<F>(&self, jobs: Vec<JobRecord>, work: F) -> BatchResult
    where
        F: Fn(&JobRecord) -> Result<serde_json::Value, String> + Sync + Send,
    {
        for job in &jobs {
            self.state.submit(job.clone());
        }
        let batch_start = Instant::now();
        let results: ResultSink = Arc::new(Mutex::new(HashMap::new()));

        match self.mode {
            ExecutionMode::Inline => self.run_inline(&jobs, &work, &results),
            ExecutionMode::ThreadPool { workers } => self.run_thread_pool(&jobs, &work, workers, &results),
            ExecutionMode::WorkerProcess { workers } => self.run_worker_process(&jobs, &work, workers, &results),
        }

        self.collect_batch_result(batch_start, results)
    }

    fn run_inline<F>(&self, jobs: &[JobRecord], work: &F, results: &ResultSink)
    where
        F: Fn(&JobRecord) -> Result<serde_json::Value, String>,
    {
        for job in jobs {
            if self.shutdown_requested.load(Ordering::SeqCst) {
                self.state.cancel(&job.id);
                continue;
            }
            self.run_one(job, work, results);
        }
    }

    fn run_thread_pool<F>(&self, jobs: &[JobRecord], work: &F, workers: usize, results: &ResultSink)
    where
        F: Fn(&JobRecord) -> Result<serde_json::Value, String> + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(workers.max(1)).build();
        let Ok(pool) = pool else {
            self.run_inline(jobs, work, results);
            return;
        };
        pool.install(|| {
            use rayon::prelude::*;
            jobs.par_iter().for_each(|job| {
                if self.shutdown_requested.load(Ordering::SeqCst) {
                    self.state.cancel(&job.id);
                    return;
                }
                self.run_one(job, work, results);
            });
        });
    }

    fn run_worker_process<F>(&self, jobs: &[JobRecord], work: &F, workers: usize, results: &ResultSink)
    where
        F: Fn(&JobRecord) -> Result<serde_json::Value, String> + Sync,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread().worker_threads(workers.max(1)).enable_all().build();
        let Ok(runtime) = runtime else {
            self.run_inline(jobs, work, results);
            return;
        };

        runtime.block_on(async {
            let mut handles = Vec::with_capacity(jobs.len());
            for job in jobs {
                if self.shutdown_requested.load(Ordering::SeqCst) {
                    self.state.cancel(&job.id);
                    continue;
                }
                self.state.start(&job.id);
                let state = self.state.clone();
                let results = results.clone();
                let job = job.clone();
                handles.push(tokio::task::spawn_blocking(move || {
                    (job, state, results)
                }));
            }
            for handle in handles {
                if let Ok((job, state, results)) = handle.await {
                    match work(&job) {
                        Ok(value) => {
                            state.complete(&job.id);
                            results.lock().unwrap().insert(job.id.clone(), value);
                        }
                        Err(err) => state.fail(&job.id, err),
                    }
                }
            }
        });
    }

    fn run_one<F>(&self, job: &JobRecord, work: &F, results: &ResultSink)
    where
        F: Fn(&JobRecord) -> Result<serde_json::Value, String>,
    {
        self.state.start(&job.id);
        match work(job) {
            Ok(value) => {
                self.state.complete(&job.id);
                results.lock().unwrap().insert(job.id.clone(), value);
            }
            Err(err) => self.state.fail(&job.id, err),
        }
    }

    fn collect_batch_result(&self, batch_start: Instant, results: ResultSink) -> BatchResult {
        let snapshot = self.state.snapshot();
        let mut results = Arc::try_unwrap(results).map(|m| m.into_inner().unwrap()).unwrap_or_default();
        let mut errors = HashMap::new();
        let mut completed = 0usize;

        for job in &snapshot {
            match job.status {
                JobStatus::Completed => completed += 1,
                JobStatus::Failed => {
                    if let Some(err) = &job.error {
                        errors.insert(job.id.clone(), err.clone());
                    }
                }
                _ => {}
            }
        }

        let collected_results: HashMap<JobId, serde_json::Value> =
            snapshot.iter().filter_map(|job| results.remove(&job.id).map(|v| (job.id.clone(), v))).collect();

        let total_time = batch_start.elapsed();
        let throughput = if total_time.as_secs_f64() > 0.0 { completed as f64 / total_time.as_secs_f64() } else { 0.0 };

        BatchResult { results: collected_results, errors, total_time, throughput }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn job(id: &str) -> JobRecord {
        JobRecord::queued(JobId::new(id), PathBuf::from(format!("{id}.py")), "python")
    }

    #[test]
    fn inline_mode_runs_every_job_and_reports_throughput() {
        let manager = ProcessManager::new(ExecutionMode::Inline);
        let result = manager.run_batch(vec![job("a"), job("b")], |j| Ok(serde_json::json!({ "id": j.id.0 })));
        assert_eq!(result.errors.len(), 0);
        assert_eq!(result.results.len(), 2);
        assert!(result.throughput >= 0.0);
    }

    #[test]
    fn inline_mode_records_failures_without_aborting_the_batch() {
        let manager = ProcessManager::new(ExecutionMode::Inline);
        let result = manager.run_batch(vec![job("a"), job("b")], |j| {
            if j.id.0 == "a" {
                Err("boom".to_string())
            } else {
                Ok(serde_json::json!(null))
            }
        });
        assert_eq!(result.errors.get(&JobId::new("a")).map(|s| s.as_str()), Some("boom"));
        assert_eq!(result.results.len(), 1);
    }

    #[test]
    fn thread_pool_mode_completes_all_jobs() {
        let manager = ProcessManager::new(ExecutionMode::ThreadPool { workers: 2 });
        let result = manager.run_batch(vec![job("a"), job("b"), job("c")], |_| Ok(serde_json::json!(true)));
        assert_eq!(result.results.len(), 3);
    }
}
