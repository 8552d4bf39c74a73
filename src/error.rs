use thiserror::Error;

/// Error kinds of the equity service.
///
/// Trial-level failures are not errors: a bad deal yields a neutral
/// simulation result and the job keeps running. Resource failures on
/// the telemetry segment degrade the job to run without telemetry.
#[derive(Debug, Error)]
pub enum EngineError {
    /// malformed request; no job is created
    #[error("validation: {0}")]
    Validation(String),

    /// status query for an unknown job id
    #[error("no such job: {0}")]
    NotFound(String),

    /// shared memory or table file unavailable
    #[error("resource: {0}")]
    Resource(String),

    /// the seqlock reader exhausted its retry budget; writer presumed dead
    #[error("seqlock reader exhausted its retry budget")]
    SeqlockHang,

    /// a worker died outside the classified cases
    #[error("fatal: {0}")]
    Fatal(String),
}
