use thiserror::Error;

/// Failures surfaced by the task runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("the runtime has been dropped")]
    RuntimeGone,
    #[error("the coroutine scope has been cancelled")]
    ScopeCancelled,
    #[error("background work panicked: {0}")]
    BackgroundPanicked(String),
    #[error("failed to spawn a background worker")]
    BackgroundSpawn(#[from] std::io::Error),
}
