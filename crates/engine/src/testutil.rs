//! Scripted fakes shared by the engine tests.

use crate::artwork::ArtworkFetcher;
use async_trait::async_trait;
use playdeck_client::{ClientError, PlaybackControl};
use playdeck_core::{ArtworkRef, PlaybackSnapshot, TrackId, TrackInfo};
use playdeck_surface::ArtworkImage;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tokio::sync::mpsc;

/// One scripted answer to a `get_state` poll.
pub(crate) enum Scripted {
    State(PlaybackSnapshot),
    Error,
}

/// Playback handle that replays a fixed poll script. Once the script is
/// exhausted it signals the test and parks the caller forever, so a loop
/// under test sits in its fetch until the test flips the shutdown signal.
pub(crate) struct ScriptedClient {
    script: Mutex<VecDeque<Scripted>>,
    exhausted_tx: mpsc::UnboundedSender<()>,
    commands: Mutex<Vec<&'static str>>,
}

impl ScriptedClient {
    pub(crate) fn new(script: Vec<Scripted>) -> (Arc<Self>, mpsc::UnboundedReceiver<()>) {
        let (exhausted_tx, exhausted_rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                script: Mutex::new(script.into()),
                exhausted_tx,
                commands: Mutex::new(Vec::new()),
            }),
            exhausted_rx,
        )
    }

    pub(crate) fn issued_commands(&self) -> Vec<&'static str> {
        self.commands.lock().unwrap().clone()
    }

    fn record(&self, command: &'static str) -> Result<(), ClientError> {
        self.commands.lock().unwrap().push(command);
        Ok(())
    }
}

#[async_trait]
impl PlaybackControl for ScriptedClient {
    async fn get_state(&self) -> Result<PlaybackSnapshot, ClientError> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::State(snapshot)) => Ok(snapshot),
            Some(Scripted::Error) => Err(ClientError::Status { code: 503 }),
            None => {
                let _ = self.exhausted_tx.send(());
                std::future::pending().await
            }
        }
    }

    async fn play(&self) -> Result<(), ClientError> {
        self.record("play")
    }

    async fn pause(&self) -> Result<(), ClientError> {
        self.record("pause")
    }

    async fn next(&self) -> Result<(), ClientError> {
        self.record("next")
    }

    async fn previous(&self) -> Result<(), ClientError> {
        self.record("previous")
    }
}

pub(crate) struct CountingFetcher {
    pub(crate) calls: Arc<AtomicUsize>,
    pub(crate) fail: bool,
}

impl CountingFetcher {
    pub(crate) fn new(fail: bool) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: calls.clone(),
                fail,
            },
            calls,
        )
    }
}

#[async_trait]
impl ArtworkFetcher for CountingFetcher {
    async fn fetch(&self, _url: &str) -> Result<ArtworkImage, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err("connection reset".to_string())
        } else {
            Ok(ArtworkImage::solid(8, 8, [1, 2, 3, 255]))
        }
    }
}

pub(crate) fn track_snapshot(id: &str, playing: bool) -> PlaybackSnapshot {
    PlaybackSnapshot {
        is_playing: playing,
        track: Some(TrackInfo {
            id: TrackId::new(id),
            title: "Title".to_string(),
            artist: "Artist".to_string(),
            duration_ms: Some(100_000),
            artwork: vec![ArtworkRef {
                url: format!("https://img.example/{id}"),
                width: Some(300),
                height: Some(300),
            }],
        }),
        progress_ms: 40_000,
        fetched_at: SystemTime::now(),
    }
}
