use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProximityError {
    #[error("proximity target {id} has invalid data: {reason}")]
    InvalidTargetData { id: String, reason: String },

    #[error("proximity target {0} is already registered")]
    DuplicateTarget(String),

    #[error("proximity target {0} is not registered")]
    UnknownTarget(String),
}

/// Failure reported by a proximity handler.
///
/// Handler failures are isolated: the engine records them and keeps
/// evaluating the remaining targets.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
