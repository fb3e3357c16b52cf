use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Transport failures; the connection task recovers from all of them by reconnecting
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("failed to connect: {0}")]
    Connect(#[source] tungstenite::Error),

    #[error("transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("no traffic from server for {0:?}")]
    HeartbeatTimeout(std::time::Duration),

    #[error("connection closed by server")]
    ClosedByPeer,
}
