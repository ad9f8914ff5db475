mod browser;
mod config;
mod logging;
mod ports;
mod services;
mod spotify_rs;
#[cfg(test)]
mod test_utils;
mod track;

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::{Result, eyre::WrapErr};

use crate::{
    browser::ChromiumBrowser,
    config::{Config, ConfigOverrides, SourceSettings},
    logging::setup_logging,
    ports::spotify::{Session, SpotifyClient},
    services::{
        extractor::extract_tracks,
        spotify::client::SpotifyHttpAdapter,
        sync::{PlaylistSynchronizer, SyncOptions},
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "MAUNDY_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Console log level
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "MAUNDY_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    overrides: OverrideArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Configuration values that take precedence over the config file.
#[derive(ClapArgs, Debug)]
struct OverrideArgs {
    /// Chromium-family browser executable
    #[arg(long, env = "MAUNDY_BROWSER_PATH", global = true)]
    browser_path: Option<PathBuf>,

    /// How long the page must stay unchanged before scraping (e.g. "500ms")
    #[arg(long, global = true)]
    settle_interval: Option<String>,

    /// Apple Music playlist URL to mirror
    #[arg(long, env = "MAUNDY_APPLE_PLAYLIST_URL", global = true)]
    apple_playlist_url: Option<String>,

    /// Spotify application client id
    #[arg(long, env = "MAUNDY_SPOTIFY_CLIENT_ID", global = true)]
    spotify_client_id: Option<String>,

    /// Spotify application client secret
    #[arg(long, env = "MAUNDY_SPOTIFY_CLIENT_SECRET", global = true, hide_env_values = true)]
    spotify_client_secret: Option<String>,

    /// Spotify refresh token
    #[arg(long, env = "MAUNDY_SPOTIFY_REFRESH_TOKEN", global = true, hide_env_values = true)]
    spotify_refresh_token: Option<String>,

    /// Spotify playlist to overwrite
    #[arg(long, env = "MAUNDY_SPOTIFY_PLAYLIST_ID", global = true)]
    spotify_playlist_id: Option<String>,

    /// Per-request HTTP timeout (e.g. "30s")
    #[arg(long, global = true)]
    http_timeout: Option<String>,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(args: OverrideArgs) -> Self {
        Self {
            browser_executable: args.browser_path,
            settle_interval: args.settle_interval,
            playlist_url: args.apple_playlist_url,
            client_id: args.spotify_client_id,
            client_secret: args.spotify_client_secret,
            refresh_token: args.spotify_refresh_token,
            playlist_id: args.spotify_playlist_id,
            http_timeout: args.http_timeout,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replace the Spotify playlist with the tracks of the Apple Music playlist
    Sync {
        /// Match every track but leave the Spotify playlist untouched
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the tracks found on the Apple Music playlist page
    Scrape,
    /// Log in to Spotify and print the name of the target playlist
    Playlist,
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Load .env before parsing so its values feed the `env` fallbacks of the CLI.
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("-- Maundy --");
    match dotenv {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) => log::debug!("No .env file loaded: {}", e),
    }

    let mut config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load maundy config")?;
    config.apply_overrides(args.overrides.into());
    log::debug!("Configuration:\n{}", config);

    match args.command {
        Commands::Sync { dry_run } => {
            let (source, spotify) = config.sync_settings()?;
            let client = SpotifyHttpAdapter::new(spotify.http_timeout)?;

            let browser = ChromiumBrowser::launch(&source.browser_executable).await?;
            let page = browser
                .open(&source.playlist_url, source.settle_interval)
                .await;

            let result = match page {
                Ok(page) => {
                    let mut synchronizer = PlaylistSynchronizer::new(
                        &client,
                        spotify.credentials,
                        SyncOptions {
                            playlist_id: spotify.playlist_id,
                            dry_run,
                        },
                    );
                    let result = synchronizer.run(&page).await;
                    log::debug!("Sync finished in state {:?}", synchronizer.state());
                    result.map_err(color_eyre::Report::from)
                }
                Err(e) => Err(e),
            };

            let report = browser
                .close_with(result)
                .await
                .wrap_err("Playlist sync failed")?;
            if report.updated {
                log::info!("Playlist synced");
            } else {
                for (track, resolved) in &report.tracks {
                    println!("{}\t'{}'\t{}", track, resolved.name, resolved.uri);
                }
            }
        }
        Commands::Scrape => {
            let source = config.source_settings()?;
            for track in scrape(&source).await? {
                println!("{}\t{}", track.title, track.artist);
            }
        }
        Commands::Playlist => {
            let spotify = config.spotify_settings()?;
            let client = SpotifyHttpAdapter::new(spotify.http_timeout)?;
            let session = match client.authenticate(&spotify.credentials).await {
                Session::Authenticated(session) => session,
                Session::Unauthenticated { reason } => {
                    return Err(color_eyre::eyre::eyre!("Spotify login failed: {}", reason));
                }
            };
            let playlist = client
                .playlist(&session, &spotify.playlist_id)
                .await
                .wrap_err_with(|| {
                    format!("Failed to fetch playlist {}", spotify.playlist_id)
                })?;
            println!("{}", playlist.name);
        }
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                log::info!("Default config at {}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
    }

    Ok(())
}

async fn scrape(source: &SourceSettings) -> Result<Vec<track::Track>> {
    let browser = ChromiumBrowser::launch(&source.browser_executable).await?;
    let result = match browser
        .open(&source.playlist_url, source.settle_interval)
        .await
    {
        Ok(page) => extract_tracks(&page)
            .await
            .wrap_err("Failed to extract tracks from the source page"),
        Err(e) => Err(e),
    };
    browser.close_with(result).await
}
