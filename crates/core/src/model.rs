use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Opaque identifier of a track as reported by the playback service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlayIcon {
    Play,
    Pause,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtworkRef {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackInfo {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub duration_ms: Option<u64>,
    pub artwork: Vec<ArtworkRef>,
}

/// Point-in-time read of the remote player. One fresh value per poll,
/// never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub is_playing: bool,
    pub track: Option<TrackInfo>,
    pub progress_ms: u64,
    pub fetched_at: SystemTime,
}

impl PlaybackSnapshot {
    /// Snapshot for an account with no active playback session.
    pub fn idle(fetched_at: SystemTime) -> Self {
        Self {
            is_playing: false,
            track: None,
            progress_ms: 0,
            fetched_at,
        }
    }

    /// The transport icon the display should show: pause while something is
    /// actually playing, play otherwise (including when no track is loaded).
    pub fn play_icon(&self) -> PlayIcon {
        if self.is_playing && self.track.is_some() {
            PlayIcon::Pause
        } else {
            PlayIcon::Play
        }
    }

    /// Position within the current track as a fraction in `[0, 1]`.
    ///
    /// The remote source can report progress past the track duration for a
    /// poll or two; that clamps to 1.0 rather than erroring. No track or no
    /// duration reads as 0.0.
    pub fn progress_fraction(&self) -> f64 {
        let duration_ms = match self.track.as_ref().and_then(|t| t.duration_ms) {
            Some(d) if d > 0 => d,
            _ => return 0.0,
        };
        (self.progress_ms as f64 / duration_ms as f64).clamp(0.0, 1.0)
    }
}
