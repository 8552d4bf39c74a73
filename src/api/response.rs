use super::jobs::JobState;
use super::jobs::JobStatus;
use crate::simulation::result::EquityResult;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct JobCreated {
    pub job_id: String,
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&JobState> for JobStatusResponse {
    fn from(state: &JobState) -> Self {
        Self {
            job_id: state.id.clone(),
            status: state.status,
            progress: state.progress,
            created_at: state.created_at,
            completed_at: state.completed_at,
            error: state.error.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobResults {
    pub job_id: String,
    pub results: BTreeMap<String, EquityResult>,
}
