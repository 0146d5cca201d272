//! Derives what the transport row shows and how fast to poll for it.

use playdeck_core::{ConfigIntervals, PlayIcon, PlaybackSnapshot};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub icon: PlayIcon,
    pub fraction: f64,
}

pub fn derive_progress(snapshot: &PlaybackSnapshot) -> ProgressUpdate {
    ProgressUpdate {
        icon: snapshot.play_icon(),
        fraction: snapshot.progress_fraction(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// A track is playing; poll near-continuously so the bar moves smoothly.
    Active,
    /// Paused or nothing loaded; back off to keep request volume down.
    Idle,
}

pub fn cadence_for(snapshot: &PlaybackSnapshot) -> Cadence {
    if snapshot.is_playing && snapshot.track.is_some() {
        Cadence::Active
    } else {
        Cadence::Idle
    }
}

#[derive(Debug, Clone)]
pub struct CadencePolicy {
    active: Duration,
    idle: Duration,
}

impl CadencePolicy {
    pub fn from_intervals(intervals: &ConfigIntervals) -> Self {
        Self {
            active: Duration::from_millis(intervals.active_poll_ms),
            idle: Duration::from_millis(intervals.idle_poll_ms),
        }
    }

    pub fn sleep_for(&self, cadence: Cadence) -> Duration {
        match cadence {
            Cadence::Active => self.active,
            Cadence::Idle => self.idle,
        }
    }
}
