use thiserror::Error;

/// A single remote read failed. Every variant is transient from the
/// engine's point of view: the attempt is logged and the wait keeps
/// retrying until its attempt budget runs out.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote error: {0}")]
    Remote(String),

    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("malformed status payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SampleError {
    pub fn transport(message: impl Into<String>) -> Self {
        SampleError::Transport(message.into())
    }

    pub fn remote(message: impl Into<String>) -> Self {
        SampleError::Remote(message.into())
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        SampleError::NotFound(entity.into())
    }
}

/// Terminal non-goal outcome of a wait, for callers that want to map
/// FAILED / TIMED_OUT / cancellation onto `?` instead of matching on
/// [`PollOutcome`](crate::PollOutcome).
#[derive(Debug, Error)]
pub enum ConvergenceError {
    #[error("failure state {state} observed after {attempts} attempts")]
    Failed { state: String, attempts: u32 },

    #[error("timed out after {attempts} attempts, last state {last_state}")]
    TimedOut { last_state: String, attempts: u32 },

    #[error("wait cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}
