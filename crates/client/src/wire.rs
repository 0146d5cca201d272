//! Serde mirror of the player-state endpoint payload.

use playdeck_core::{ArtworkRef, PlaybackSnapshot, TrackId, TrackInfo};
use serde::Deserialize;
use std::time::SystemTime;

#[derive(Debug, Deserialize)]
pub(crate) struct PlayerStateWire {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    pub item: Option<ItemWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemWire {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistWire>,
    pub duration_ms: Option<u64>,
    pub album: Option<AlbumWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistWire {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlbumWire {
    #[serde(default)]
    pub images: Vec<ImageWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageWire {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl PlayerStateWire {
    pub(crate) fn into_snapshot(self, fetched_at: SystemTime) -> PlaybackSnapshot {
        let progress_ms = self.progress_ms.unwrap_or(0);
        let is_playing = self.is_playing;
        let track = self.item.map(|item| {
            let artist = item
                .artists
                .first()
                .map(|a| a.name.clone())
                .unwrap_or_else(|| "Unknown Artist".to_string());
            // Local files come back without an id; key them by artist+title.
            let id = item
                .id
                .unwrap_or_else(|| format!("{}:{}", artist, item.name));
            let artwork = item
                .album
                .map(|album| {
                    album
                        .images
                        .into_iter()
                        .map(|img| ArtworkRef {
                            url: img.url,
                            width: img.width,
                            height: img.height,
                        })
                        .collect()
                })
                .unwrap_or_default();
            TrackInfo {
                id: TrackId::new(id),
                title: item.name,
                artist,
                duration_ms: item.duration_ms,
                artwork,
            }
        });

        PlaybackSnapshot {
            is_playing,
            track,
            progress_ms,
            fetched_at,
        }
    }
}
