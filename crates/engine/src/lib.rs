pub mod artwork;
pub mod command;
pub mod progress;
pub mod sync;

pub use artwork::{ArtworkFetcher, ArtworkResolver, HttpArtworkFetcher};
pub use command::{run_command_handler, Command};
pub use progress::{cadence_for, derive_progress, Cadence, CadencePolicy, ProgressUpdate};
pub use sync::{run_artwork_loop, run_progress_loop, Backoff};

#[cfg(test)]
pub(crate) mod testutil;
