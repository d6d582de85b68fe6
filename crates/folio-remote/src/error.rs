use thiserror::Error;

/// Failures talking to the advice service or GitHub, or generating a profile.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("profile generation failed: {0}")]
    Generator(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;
