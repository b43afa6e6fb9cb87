//! Job scheduling and batch execution for the ingestion pipeline.

pub mod job;
pub mod manager;
pub mod state;

pub use job::{JobId, JobRecord, JobStatus};
pub use manager::{BatchResult, ExecutionMode, ProcessManager};
pub use state::{Progress, SchedulerState};
