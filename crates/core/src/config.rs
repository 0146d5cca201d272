use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_schema_version() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigIntervals {
    /// Sleep between polls while a track is actively playing.
    pub active_poll_ms: u64,
    /// Sleep between polls while paused or nothing is loaded.
    pub idle_poll_ms: u64,
    /// Upper bound on any single network call to the playback service.
    pub request_timeout_ms: u64,
    /// Successive sleeps after failed polls; the last step repeats.
    pub error_backoff_ms: Vec<u64>,
}

impl Default for ConfigIntervals {
    fn default() -> Self {
        Self {
            active_poll_ms: 1,
            idle_poll_ms: 100,
            request_timeout_ms: 5_000,
            error_backoff_ms: vec![250, 500, 1_000, 2_000, 5_000],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    /// Bearer token produced by the authorization handshake.
    pub access_token: String,
    pub api_base_url: String,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            access_token: "YOUR_SPOTIFY_ACCESS_TOKEN".to_string(),
            api_base_url: "https://api.spotify.com/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub topics: Vec<String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "10.180.0.9".to_string(),
            port: 1883,
            client_id: "door_app".to_string(),
            topics: vec![
                "zigbee2mqtt/Dvere Petr".to_string(),
                "zigbee2mqtt/tlacitko".to_string(),
            ],
        }
    }
}

impl BrokerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Bundled image shown when no artwork is available or retrievable.
    /// A missing or unreadable file falls back to a generated black square.
    pub placeholder_path: Option<PathBuf>,
    /// Smallest acceptable edge, in pixels, when picking an artwork size.
    pub min_artwork_edge: u32,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            placeholder_path: Some(PathBuf::from("resources/black.png")),
            min_artwork_edge: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub intervals: ConfigIntervals,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            spotify: SpotifyConfig::default(),
            broker: BrokerConfig::default(),
            intervals: ConfigIntervals::default(),
            assets: AssetsConfig::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
