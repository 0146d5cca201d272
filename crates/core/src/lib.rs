pub mod config;
pub mod model;

pub use config::{AppConfig, AssetsConfig, BrokerConfig, ConfigIntervals, SpotifyConfig};
pub use model::{ArtworkRef, PlayIcon, PlaybackSnapshot, TrackId, TrackInfo};
