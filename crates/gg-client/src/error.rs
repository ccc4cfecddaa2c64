use thiserror::Error;
use uuid::Uuid;

use crate::inflight::InFlight;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Rejected before sending, or a 400 from the server.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Network failure or any other non-2xx response.
    #[error("request failed: {0}")]
    Transport(String),

    /// Another mutation is still running for this gossip.
    #[error("gossip {id} is busy ({kind:?})")]
    Busy { id: Uuid, kind: InFlight },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
