use land_detector_core::parameters::ParameterError;

/// Errors from the land detector runtime.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("Sensor bus poisoned by a panicking producer")]
    BusPoisoned,

    #[error("Runner task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
