//! Fire-and-forget transport commands from the control surface.
//!
//! No result travels back to the button that issued a command; the next
//! scheduled poll observes whatever the command did to the player.

use playdeck_client::{ClientError, PlaybackControl};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Previous,
    TogglePlayPause,
    Next,
}

/// Drains control-surface commands until every sender is gone.
pub async fn run_command_handler(
    client: Arc<dyn PlaybackControl>,
    mut commands: mpsc::Receiver<Command>,
) {
    while let Some(command) = commands.recv().await {
        if let Err(err) = dispatch(client.as_ref(), command).await {
            warn!(?command, error = %err, "transport command failed");
        }
    }
    debug!("command handler stopped");
}

async fn dispatch(client: &dyn PlaybackControl, command: Command) -> Result<(), ClientError> {
    match command {
        Command::Previous => client.previous().await,
        Command::Next => client.next().await,
        Command::TogglePlayPause => {
            // Direction depends on the player's current state, fetched here
            // rather than trusted from the possibly-stale display.
            let snapshot = client.get_state().await?;
            if snapshot.is_playing {
                client.pause().await
            } else {
                client.play().await
            }
        }
    }
}
