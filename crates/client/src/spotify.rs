use crate::wire::PlayerStateWire;
use crate::{ClientError, PlaybackControl};
use async_trait::async_trait;
use playdeck_core::{PlaybackSnapshot, SpotifyConfig};
use reqwest::{header, Client, Method, StatusCode};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Web API implementation of [`PlaybackControl`].
///
/// Holds a bearer token handed over by the authorization handshake; token
/// refresh is the caller's problem, a rejected token surfaces as
/// [`ClientError::Unauthorized`].
pub struct SpotifyClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl SpotifyClient {
    pub fn new(cfg: &SpotifyConfig, request_timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            base_url: cfg.api_base_url.trim_end_matches('/').to_string(),
            access_token: cfg.access_token.clone(),
        })
    }

    async fn transport_command(&self, method: Method, path: &str) -> Result<(), ClientError> {
        debug!(%path, "issuing transport command");
        let resp = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.access_token)
            .header(header::CONTENT_LENGTH, 0)
            .send()
            .await?;
        check_status(resp.status())
    }
}

fn check_status(status: StatusCode) -> Result<(), ClientError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ClientError::Unauthorized);
    }
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::Status {
            code: status.as_u16(),
        })
    }
}

#[async_trait]
impl PlaybackControl for SpotifyClient {
    async fn get_state(&self) -> Result<PlaybackSnapshot, ClientError> {
        let resp = self
            .http
            .get(format!("{}/me/player", self.base_url))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = resp.status();
        // 204: no device has an active session; not an error.
        if status == StatusCode::NO_CONTENT {
            return Ok(PlaybackSnapshot::idle(SystemTime::now()));
        }
        check_status(status)?;

        let body = resp.bytes().await?;
        let wire: PlayerStateWire = serde_json::from_slice(&body)?;
        Ok(wire.into_snapshot(SystemTime::now()))
    }

    async fn play(&self) -> Result<(), ClientError> {
        self.transport_command(Method::PUT, "/me/player/play").await
    }

    async fn pause(&self) -> Result<(), ClientError> {
        self.transport_command(Method::PUT, "/me/player/pause").await
    }

    async fn next(&self) -> Result<(), ClientError> {
        self.transport_command(Method::POST, "/me/player/next").await
    }

    async fn previous(&self) -> Result<(), ClientError> {
        self.transport_command(Method::POST, "/me/player/previous")
            .await
    }
}
