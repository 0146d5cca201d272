use async_trait::async_trait;
use playdeck_core::PlaybackSnapshot;
use thiserror::Error;

mod spotify;
mod wire;

pub use spotify::SpotifyClient;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("playback service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("playback service returned status {code}")]
    Status { code: u16 },
    #[error("access token rejected by the playback service")]
    Unauthorized,
    #[error("malformed player state payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Handle onto the remote player. Every call may block on network I/O and
/// may fail; callers decide whether a failure is retried or dropped.
#[async_trait]
pub trait PlaybackControl: Send + Sync {
    async fn get_state(&self) -> Result<PlaybackSnapshot, ClientError>;
    async fn play(&self) -> Result<(), ClientError>;
    async fn pause(&self) -> Result<(), ClientError>;
    async fn next(&self) -> Result<(), ClientError>;
    async fn previous(&self) -> Result<(), ClientError>;
}
