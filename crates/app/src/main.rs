use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use playdeck_client::{PlaybackControl, SpotifyClient};
use playdeck_core::AppConfig;
use playdeck_engine::{
    run_artwork_loop, run_command_handler, run_progress_loop, ArtworkResolver, Backoff,
    CadencePolicy, HttpArtworkFetcher,
};
use playdeck_ingress::{run_ingress, LogHandler};
use playdeck_surface::{UiModel, UiModelReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "playdeck",
    about = "Spotify playback companion: poll loops -> shared UI model"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Run,
    Doctor,
    Status,
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cmd = cli.command.unwrap_or(Commands::Run);
    let cfg_path = cli.config.unwrap_or_else(default_config_path);

    match cmd {
        Commands::Config {
            action: ConfigAction::Init,
        } => {
            init_config(&cfg_path)?;
            println!("Initialized config at {}", cfg_path.display());
            Ok(())
        }
        Commands::Doctor => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            doctor(&cfg).await
        }
        Commands::Status => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            status(&cfg).await
        }
        Commands::Run => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            run(cfg).await
        }
    }
}

async fn run(cfg: AppConfig) -> Result<()> {
    let request_timeout = Duration::from_millis(cfg.intervals.request_timeout_ms);
    let client: Arc<dyn PlaybackControl> =
        Arc::new(SpotifyClient::new(&cfg.spotify, request_timeout).context("building playback client")?);
    let fetcher = HttpArtworkFetcher::new(request_timeout).context("building artwork fetcher")?;
    let resolver = ArtworkResolver::new(&cfg.assets, fetcher);
    let policy = CadencePolicy::from_intervals(&cfg.intervals);

    let (ui_handle, ui_reader, ui_model) = UiModel::channel(resolver.placeholder().clone());
    let ui_owner = tokio::spawn(ui_model.run());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let progress_loop = tokio::spawn(run_progress_loop(
        client.clone(),
        ui_handle.clone(),
        policy.clone(),
        Backoff::from_steps_ms(&cfg.intervals.error_backoff_ms),
        shutdown_rx.clone(),
    ));
    let artwork_loop = tokio::spawn(run_artwork_loop(
        client.clone(),
        ui_handle.clone(),
        resolver,
        policy,
        Backoff::from_steps_ms(&cfg.intervals.error_backoff_ms),
        shutdown_rx.clone(),
    ));

    // The control surface (buttons) plugs into this sender; the reader is
    // what a window toolkit renders from. The built-in consumer below just
    // traces changes so a headless run shows life.
    let (command_tx, command_rx) = mpsc::channel(8);
    let command_handler = tokio::spawn(run_command_handler(client.clone(), command_rx));
    let display_watcher = tokio::spawn(watch_display(ui_reader, shutdown_rx.clone()));

    let ingress = if cfg.broker.enabled {
        Some(tokio::spawn(run_ingress(
            cfg.broker.clone(),
            Arc::new(LogHandler),
            shutdown_rx.clone(),
        )))
    } else {
        None
    };

    info!("playdeck started");
    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("received ctrl-c; shutting down");
    let _ = shutdown_tx.send(true);

    progress_loop.await?;
    artwork_loop.await?;
    display_watcher.await?;
    if let Some(task) = ingress {
        task.await?;
    }
    drop(command_tx);
    command_handler.await?;
    drop(ui_handle);
    ui_owner.await?;
    Ok(())
}

/// Stand-in presentation consumer: traces icon and artwork transitions.
async fn watch_display(mut reader: UiModelReader, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            changed = reader.icon.changed() => {
                if changed.is_err() {
                    break;
                }
                let icon = *reader.icon.borrow();
                debug!(?icon, "transport icon changed");
            }
            changed = reader.artwork.changed() => {
                if changed.is_err() {
                    break;
                }
                let (width, height) = {
                    let image = reader.artwork.borrow();
                    (image.width, image.height)
                };
                debug!(width, height, "artwork changed");
            }
            _ = shutdown.changed() => break,
        }
    }
}

async fn doctor(cfg: &AppConfig) -> Result<()> {
    println!("== playdeck doctor ==");

    if cfg.broker.enabled {
        let reachable = broker_reachable(&cfg.broker.address()).await;
        println!(
            "Broker {}: {}",
            cfg.broker.address(),
            if reachable { "reachable" } else { "not reachable" }
        );
    } else {
        println!("Broker: disabled in config");
    }

    if cfg.spotify.access_token == playdeck_core::SpotifyConfig::default().access_token {
        println!("Playback service: access token not configured");
        return Ok(());
    }

    let request_timeout = Duration::from_millis(cfg.intervals.request_timeout_ms);
    let client = SpotifyClient::new(&cfg.spotify, request_timeout)?;
    match client.get_state().await {
        Ok(snapshot) => {
            println!("Playback service: reachable");
            match snapshot.track {
                Some(track) => println!("Now playing: {} - {}", track.artist, track.title),
                None => println!("No active playback session"),
            }
        }
        Err(err) => println!("Playback service error: {err}"),
    }

    Ok(())
}

async fn status(cfg: &AppConfig) -> Result<()> {
    let request_timeout = Duration::from_millis(cfg.intervals.request_timeout_ms);
    let client = SpotifyClient::new(&cfg.spotify, request_timeout)?;
    let snapshot = client.get_state().await.context("fetching player state")?;

    let fraction = snapshot.progress_fraction();
    println!("playing: {}", snapshot.is_playing);
    match &snapshot.track {
        Some(track) => {
            println!("track: {} - {}", track.artist, track.title);
            println!("progress: {:.0}%", fraction * 100.0);
        }
        None => println!("track: <none>"),
    }

    Ok(())
}

async fn broker_reachable(address: &str) -> bool {
    tokio::time::timeout(
        Duration::from_millis(500),
        tokio::net::TcpStream::connect(address),
    )
    .await
    .ok()
    .and_then(Result::ok)
    .is_some()
}

fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("playdeck").join("config.toml")
}

fn init_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let cfg = AppConfig::default();
    let toml = toml::to_string_pretty(&cfg)?;
    std::fs::write(path, toml)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}

fn load_or_default(path: &Path) -> Result<AppConfig> {
    let mut cfg = if !path.exists() {
        AppConfig::default()
    } else {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))?
    };
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

fn init_logging(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(v) = std::env::var("PLAYDECK_ACCESS_TOKEN") {
        if !v.trim().is_empty() {
            cfg.spotify.access_token = v;
        }
    }
    if let Ok(v) = std::env::var("PLAYDECK_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.log_level = v;
        }
    }
    if let Ok(v) = std::env::var("PLAYDECK_BROKER_HOST") {
        if !v.trim().is_empty() {
            cfg.broker.host = v;
        }
    }
}
