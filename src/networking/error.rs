use thiserror::Error;

/// Failures of [`ChessGameClient`](super::ChessGameClient) operations
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Not in a game")]
    NotInGame,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Message reported by the server in `{"success": false, "error": ..}`
    #[error("{0}")]
    Server(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("Socket error: {0}")]
    Socket(String),

    #[error("Unexpected server response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
