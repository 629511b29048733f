use thiserror::Error;

use sidefx_core::RuntimeError;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("no node labelled {0:?}")]
    NodeNotFound(String),
    #[error("node {0:?} does not accept this input")]
    NotClickable(String),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
