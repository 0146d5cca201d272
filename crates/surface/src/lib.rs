//! Shared on-screen state, fed by the synchronization loops and read by the
//! presentation layer.
//!
//! A single owner task drains a queue of field-scoped updates and applies
//! each one to exactly one field. Writers hold a [`UiModelHandle`] (the
//! narrow write capability), readers hold a [`UiModelReader`] with one watch
//! channel per field, so a read always observes a completely-written value.
//! No atomicity is promised across fields.

use playdeck_core::PlayIcon;
use tokio::sync::{mpsc, watch};
use tracing::trace;

const UPDATE_QUEUE_CAPACITY: usize = 32;

/// Decoded, presentation-agnostic RGBA image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl ArtworkImage {
    pub fn solid(width: u32, height: u32, pixel: [u8; 4]) -> Self {
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            rgba.extend_from_slice(&pixel);
        }
        Self {
            width,
            height,
            rgba,
        }
    }
}

#[derive(Debug, Clone)]
pub enum UiUpdate {
    Progress(f64),
    Icon(PlayIcon),
    Artwork(ArtworkImage),
}

/// Write capability handed to the synchronization loops.
#[derive(Clone)]
pub struct UiModelHandle {
    tx: mpsc::Sender<UiUpdate>,
}

impl UiModelHandle {
    pub fn set_progress(&self, fraction: f64) {
        self.send(UiUpdate::Progress(fraction));
    }

    pub fn set_icon(&self, icon: PlayIcon) {
        self.send(UiUpdate::Icon(icon));
    }

    pub fn set_artwork(&self, image: ArtworkImage) {
        self.send(UiUpdate::Artwork(image));
    }

    // Lossy on purpose: a full queue means the owner is behind, and the
    // next poll supersedes whatever was dropped.
    fn send(&self, update: UiUpdate) {
        if self.tx.try_send(update).is_err() {
            trace!("ui update queue full; frame dropped");
        }
    }
}

/// Read side for the presentation layer; each field updates independently.
#[derive(Clone)]
pub struct UiModelReader {
    pub progress: watch::Receiver<f64>,
    pub icon: watch::Receiver<PlayIcon>,
    pub artwork: watch::Receiver<ArtworkImage>,
}

/// Owner of the mutable display state.
pub struct UiModel {
    rx: mpsc::Receiver<UiUpdate>,
    progress_tx: watch::Sender<f64>,
    icon_tx: watch::Sender<PlayIcon>,
    artwork_tx: watch::Sender<ArtworkImage>,
}

impl UiModel {
    /// Builds the model with its write handle and reader. `initial_artwork`
    /// is what the display shows before the first poll lands.
    pub fn channel(initial_artwork: ArtworkImage) -> (UiModelHandle, UiModelReader, UiModel) {
        let (tx, rx) = mpsc::channel(UPDATE_QUEUE_CAPACITY);
        let (progress_tx, progress_rx) = watch::channel(0.0);
        let (icon_tx, icon_rx) = watch::channel(PlayIcon::Play);
        let (artwork_tx, artwork_rx) = watch::channel(initial_artwork);

        let handle = UiModelHandle { tx };
        let reader = UiModelReader {
            progress: progress_rx,
            icon: icon_rx,
            artwork: artwork_rx,
        };
        let model = UiModel {
            rx,
            progress_tx,
            icon_tx,
            artwork_tx,
        };
        (handle, reader, model)
    }

    /// Drains updates until every write handle is gone.
    pub async fn run(mut self) {
        while let Some(update) = self.rx.recv().await {
            self.apply(update);
        }
    }

    fn apply(&mut self, update: UiUpdate) {
        match update {
            UiUpdate::Progress(fraction) => {
                let _ = self.progress_tx.send(fraction);
            }
            UiUpdate::Icon(icon) => {
                let _ = self.icon_tx.send(icon);
            }
            UiUpdate::Artwork(image) => {
                let _ = self.artwork_tx.send(image);
            }
        }
    }
}
