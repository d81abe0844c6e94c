//! Error types for the progression engine

/// Errors surfaced to callers of the engine.
///
/// Domain-expected conditions (unknown metric names, writes to expired
/// challenges, repeated unlock attempts) are not represented here; they are
/// logged and ignored.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ProgressError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// True for caller mistakes (as opposed to persistence failures)
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, ProgressError>;
