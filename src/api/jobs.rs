use crate::simulation::result::EquityResult;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Mutable state of one job. Guarded by the Job handle's mutex; every
/// access copies under the lock so readers always observe a consistent
/// snapshot.
#[derive(Debug, Clone)]
pub struct JobState {
    pub id: String,
    pub status: JobStatus,
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub final_results: BTreeMap<String, EquityResult>,
    pub live_results: BTreeMap<String, f64>,
}

/// shared handle to one job's state
#[derive(Clone)]
pub struct Job(Arc<Mutex<JobState>>);

impl Job {
    fn new(id: &str) -> Self {
        Self(Arc::new(Mutex::new(JobState {
            id: id.to_string(),
            status: JobStatus::Pending,
            progress: 0.0,
            created_at: Utc::now(),
            completed_at: None,
            error: None,
            final_results: BTreeMap::new(),
            live_results: BTreeMap::new(),
        })))
    }

    fn state(&self) -> MutexGuard<'_, JobState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// PENDING -> RUNNING; a no-op from any other status
    pub fn start(&self) {
        let mut state = self.state();
        if state.status == JobStatus::Pending {
            state.status = JobStatus::Running;
        }
    }

    /// progress only moves forward
    pub fn update_progress(&self, progress: f64, live: &BTreeMap<String, f64>) {
        let mut state = self.state();
        state.progress = state.progress.max(progress);
        state.live_results = live.clone();
    }

    pub fn complete(&self, results: BTreeMap<String, EquityResult>) {
        let mut state = self.state();
        if state.status.terminal() {
            return;
        }
        state.status = JobStatus::Completed;
        state.progress = 1.0;
        state.final_results = results;
        state.completed_at = Some(Utc::now());
    }

    pub fn fail(&self, error: &str) {
        let mut state = self.state();
        if state.status.terminal() {
            return;
        }
        state.status = JobStatus::Failed;
        state.error = Some(error.to_string());
        state.completed_at = Some(Utc::now());
    }

    pub fn snapshot(&self) -> JobState {
        self.state().clone()
    }
}

/// Process-wide registry of jobs for the lifetime of the service.
/// Nothing persists; a restart forgets every job.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, id: &str) -> Job {
        let job = Job::new(id);
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), job.clone());
        job
    }

    pub fn get(&self, id: &str) -> Option<Job> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn delete(&self, id: &str) {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_runs_pending_running_completed() {
        let registry = JobRegistry::new();
        let job = registry.create("j1");
        assert_eq!(job.snapshot().status, JobStatus::Pending);

        job.start();
        assert_eq!(job.snapshot().status, JobStatus::Running);

        job.complete(BTreeMap::new());
        let state = job.snapshot();
        assert_eq!(state.status, JobStatus::Completed);
        assert_eq!(state.progress, 1.0);
        assert!(state.completed_at.is_some());
    }

    #[test]
    fn completed_at_is_set_exactly_once() {
        let job = JobRegistry::new().create("j2");
        job.start();
        job.fail("boom");
        let first = job.snapshot().completed_at;
        job.complete(BTreeMap::new());
        job.fail("again");
        assert_eq!(job.snapshot().completed_at, first);
        assert_eq!(job.snapshot().status, JobStatus::Failed);
    }

    #[test]
    fn start_is_idempotent_from_pending_only() {
        let job = JobRegistry::new().create("j3");
        job.start();
        job.complete(BTreeMap::new());
        job.start();
        assert_eq!(job.snapshot().status, JobStatus::Completed);
    }

    #[test]
    fn progress_never_regresses() {
        let job = JobRegistry::new().create("j4");
        let live = BTreeMap::new();
        job.update_progress(0.5, &live);
        job.update_progress(0.25, &live);
        assert_eq!(job.snapshot().progress, 0.5);
    }

    #[test]
    fn unknown_jobs_are_absent() {
        let registry = JobRegistry::new();
        registry.create("j5");
        registry.delete("j5");
        assert!(registry.get("j5").is_none());
    }
}
