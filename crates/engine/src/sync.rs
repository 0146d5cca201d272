//! The two long-lived polling loops behind the display.
//!
//! Each loop owns its own cadence and error backoff and never reports an
//! error to anyone: a failed poll is logged, waited out, and retried, so the
//! interactive surface only ever sees the last good values until the next
//! successful poll heals the display.

use crate::artwork::{ArtworkFetcher, ArtworkResolver};
use crate::progress::{cadence_for, derive_progress, CadencePolicy};
use playdeck_client::PlaybackControl;
use playdeck_surface::UiModelHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Bounded escalation of the wait between failed polls; the final step
/// repeats until a poll succeeds again.
pub struct Backoff {
    steps: Vec<Duration>,
    idx: usize,
}

impl Backoff {
    pub fn from_steps_ms(steps_ms: &[u64]) -> Self {
        let steps = if steps_ms.is_empty() {
            vec![Duration::from_secs(1)]
        } else {
            steps_ms.iter().map(|&ms| Duration::from_millis(ms)).collect()
        };
        Self { steps, idx: 0 }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.steps[self.idx];
        self.idx = (self.idx + 1).min(self.steps.len() - 1);
        delay
    }

    pub fn reset(&mut self) {
        self.idx = 0;
    }
}

/// Keeps the progress fraction and transport icon in step with the remote
/// player until `shutdown` flips.
pub async fn run_progress_loop(
    client: Arc<dyn PlaybackControl>,
    ui: UiModelHandle,
    policy: CadencePolicy,
    mut backoff: Backoff,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }
        let fetched = tokio::select! {
            res = client.get_state() => res,
            _ = shutdown.changed() => break,
        };
        let delay = match fetched {
            Ok(snapshot) => {
                backoff.reset();
                let update = derive_progress(&snapshot);
                ui.set_icon(update.icon);
                // The bar only advances while something plays; paused and
                // idle sessions keep showing the last position.
                if snapshot.is_playing {
                    ui.set_progress(update.fraction);
                }
                policy.sleep_for(cadence_for(&snapshot))
            }
            Err(err) => {
                warn!(error = %err, "player state poll failed; keeping last shown progress");
                backoff.next_delay()
            }
        };
        if pause_for(delay, &mut shutdown).await {
            break;
        }
    }
    debug!("progress loop stopped");
}

/// Keeps the displayed artwork in step with the current track until
/// `shutdown` flips.
pub async fn run_artwork_loop<F: ArtworkFetcher>(
    client: Arc<dyn PlaybackControl>,
    ui: UiModelHandle,
    mut resolver: ArtworkResolver<F>,
    policy: CadencePolicy,
    mut backoff: Backoff,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }
        let fetched = tokio::select! {
            res = client.get_state() => res,
            _ = shutdown.changed() => break,
        };
        let delay = match fetched {
            Ok(snapshot) => {
                backoff.reset();
                if let Some(image) = resolver.resolve(&snapshot).await {
                    ui.set_artwork(image);
                }
                policy.sleep_for(cadence_for(&snapshot))
            }
            Err(err) => {
                warn!(error = %err, "player state poll failed; keeping displayed artwork");
                backoff.next_delay()
            }
        };
        if pause_for(delay, &mut shutdown).await {
            break;
        }
    }
    debug!("artwork loop stopped");
}

/// Sleeps for `delay` unless shutdown fires first; true means stop.
async fn pause_for(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = sleep(delay) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}

#[cfg(test)]
mod tests {
    use super::{run_artwork_loop, run_progress_loop, Backoff};
    use crate::artwork::ArtworkResolver;
    use crate::progress::CadencePolicy;
    use crate::testutil::{track_snapshot, CountingFetcher, Scripted, ScriptedClient};
    use playdeck_core::{AssetsConfig, ConfigIntervals, PlayIcon};
    use playdeck_surface::{ArtworkImage, UiModel};
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::sync::watch;

    fn policy() -> CadencePolicy {
        CadencePolicy::from_intervals(&ConfigIntervals::default())
    }

    fn backoff() -> Backoff {
        Backoff::from_steps_ms(&[250, 500])
    }

    fn assets() -> AssetsConfig {
        AssetsConfig {
            placeholder_path: None,
            min_artwork_edge: 64,
        }
    }

    #[test]
    fn backoff_escalates_and_holds_at_the_last_step() {
        let mut b = Backoff::from_steps_ms(&[250, 500, 1_000]);
        assert_eq!(b.next_delay(), Duration::from_millis(250));
        assert_eq!(b.next_delay(), Duration::from_millis(500));
        assert_eq!(b.next_delay(), Duration::from_millis(1_000));
        assert_eq!(b.next_delay(), Duration::from_millis(1_000));
        b.reset();
        assert_eq!(b.next_delay(), Duration::from_millis(250));
    }

    /// Drives the progress loop over `script` in virtual time and returns
    /// how long the loop spent between its first poll and script exhaustion.
    async fn drive_progress(script: Vec<Scripted>) -> (Duration, PlayIcon, f64) {
        let start = tokio::time::Instant::now();
        let (client, mut exhausted) = ScriptedClient::new(script);
        let (handle, reader, model) = UiModel::channel(ArtworkImage::solid(1, 1, [0, 0, 0, 255]));
        let owner = tokio::spawn(model.run());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let loop_task = tokio::spawn(run_progress_loop(
            client,
            handle.clone(),
            policy(),
            backoff(),
            shutdown_rx,
        ));

        exhausted.recv().await.unwrap();
        let elapsed = start.elapsed();

        shutdown_tx.send(true).unwrap();
        loop_task.await.unwrap();
        drop(handle);
        owner.await.unwrap();

        let icon = *reader.icon.borrow();
        let fraction = *reader.progress.borrow();
        (elapsed, icon, fraction)
    }

    #[tokio::test(start_paused = true)]
    async fn active_playback_polls_faster_than_idle() {
        let playing = (0..5)
            .map(|_| Scripted::State(track_snapshot("a", true)))
            .collect();
        let paused = (0..5)
            .map(|_| Scripted::State(track_snapshot("a", false)))
            .collect();

        let (active_elapsed, ..) = drive_progress(playing).await;
        let (idle_elapsed, ..) = drive_progress(paused).await;

        // Five active-cadence sleeps vs five idle-cadence sleeps.
        assert_eq!(active_elapsed, Duration::from_millis(5));
        assert_eq!(idle_elapsed, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_failure_backs_off_and_recovers() {
        let script = vec![
            Scripted::Error,
            Scripted::Error,
            Scripted::State(track_snapshot("a", true)),
        ];
        let (elapsed, icon, fraction) = drive_progress(script).await;

        // Two backoff steps plus one active-cadence sleep.
        assert_eq!(elapsed, Duration::from_millis(250 + 500 + 1));
        assert_eq!(icon, PlayIcon::Pause);
        assert_eq!(fraction, 0.4);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_playback_keeps_last_shown_progress() {
        let script = vec![
            Scripted::State(track_snapshot("a", true)),
            Scripted::State(track_snapshot("a", false)),
        ];
        let (_, icon, fraction) = drive_progress(script).await;

        assert_eq!(icon, PlayIcon::Play);
        assert_eq!(fraction, 0.4);
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_effect_lands_on_the_next_poll() {
        use crate::command::{run_command_handler, Command};
        use tokio::sync::mpsc;

        // One shared client: the toggle consumes the first scripted state,
        // the loop's next poll observes the flipped one.
        let script = vec![
            Scripted::State(track_snapshot("a", true)),
            Scripted::State(track_snapshot("a", false)),
        ];
        let (client, mut exhausted) = ScriptedClient::new(script);

        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let handler = tokio::spawn(run_command_handler(client.clone(), cmd_rx));
        cmd_tx.send(Command::TogglePlayPause).await.unwrap();
        drop(cmd_tx);
        handler.await.unwrap();
        assert_eq!(client.issued_commands(), vec!["pause"]);

        let (handle, reader, model) = UiModel::channel(ArtworkImage::solid(1, 1, [0, 0, 0, 255]));
        let owner = tokio::spawn(model.run());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let loop_task = tokio::spawn(run_progress_loop(
            client,
            handle.clone(),
            policy(),
            backoff(),
            shutdown_rx,
        ));

        exhausted.recv().await.unwrap();
        shutdown_tx.send(true).unwrap();
        loop_task.await.unwrap();
        drop(handle);
        owner.await.unwrap();

        assert_eq!(*reader.icon.borrow(), PlayIcon::Play);
    }

    #[tokio::test(start_paused = true)]
    async fn artwork_loop_downloads_once_per_distinct_track() {
        let script = vec![
            Scripted::State(track_snapshot("a", true)),
            Scripted::State(track_snapshot("a", true)),
            Scripted::State(track_snapshot("b", true)),
        ];
        let (client, mut exhausted) = ScriptedClient::new(script);
        let (fetcher, fetches) = CountingFetcher::new(false);
        let resolver = ArtworkResolver::new(&assets(), fetcher);
        let (handle, reader, model) = UiModel::channel(ArtworkImage::solid(1, 1, [0, 0, 0, 255]));
        let owner = tokio::spawn(model.run());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let loop_task = tokio::spawn(run_artwork_loop(
            client,
            handle.clone(),
            resolver,
            policy(),
            backoff(),
            shutdown_rx,
        ));

        exhausted.recv().await.unwrap();
        shutdown_tx.send(true).unwrap();
        loop_task.await.unwrap();
        drop(handle);
        owner.await.unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(reader.artwork.borrow().width, 8);
    }

    #[tokio::test(start_paused = true)]
    async fn artwork_fetch_failure_shows_placeholder_and_keeps_looping() {
        let script = vec![
            Scripted::State(track_snapshot("a", true)),
            Scripted::State(track_snapshot("a", true)),
        ];
        let (client, mut exhausted) = ScriptedClient::new(script);
        let (fetcher, fetches) = CountingFetcher::new(true);
        let resolver = ArtworkResolver::new(&assets(), fetcher);
        let placeholder = resolver.placeholder().clone();
        let (handle, reader, model) = UiModel::channel(placeholder.clone());
        let owner = tokio::spawn(model.run());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let loop_task = tokio::spawn(run_artwork_loop(
            client,
            handle.clone(),
            resolver,
            policy(),
            backoff(),
            shutdown_rx,
        ));

        exhausted.recv().await.unwrap();
        shutdown_tx.send(true).unwrap();
        loop_task.await.unwrap();
        drop(handle);
        owner.await.unwrap();

        // Both polls retried the same track; the display holds the fallback.
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(*reader.artwork.borrow(), placeholder);
    }
}
