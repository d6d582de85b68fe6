use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("sandbox session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("failed to provision sandbox: {0}")]
    Provision(String),

    /// The command ran and failed; carries its diagnostic output.
    #[error("{0}")]
    Evaluation(String),

    #[error("command timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("sandbox session stopped")]
    Stopped,

    #[error("failed to close sandbox: {0}")]
    Close(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SandboxError {
    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        Self::SessionNotFound {
            session_id: session_id.into(),
        }
    }
}
