use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{OptionExt, Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::ports::spotify::SpotifyCredentials;

pub const ENV_BROWSER_PATH: &str = "MAUNDY_BROWSER_PATH";
pub const ENV_APPLE_PLAYLIST_URL: &str = "MAUNDY_APPLE_PLAYLIST_URL";
pub const ENV_SPOTIFY_CLIENT_ID: &str = "MAUNDY_SPOTIFY_CLIENT_ID";
pub const ENV_SPOTIFY_CLIENT_SECRET: &str = "MAUNDY_SPOTIFY_CLIENT_SECRET";
pub const ENV_SPOTIFY_REFRESH_TOKEN: &str = "MAUNDY_SPOTIFY_REFRESH_TOKEN";
pub const ENV_SPOTIFY_PLAYLIST_ID: &str = "MAUNDY_SPOTIFY_PLAYLIST_ID";

const DEFAULT_SETTLE_INTERVAL: Duration = Duration::from_secs(1);

const DEFAULT_CONFIG: &str = r#"# maundy configuration
#
# Every value can also be set through the environment (or a .env file in the
# working directory); the environment wins over this file.

[browser]
# Chromium-family executable (MAUNDY_BROWSER_PATH)
# executable = "/usr/bin/chromium"
# How long the page DOM must stay unchanged before it is scraped
settle_interval = "1s"

[source]
# Apple Music playlist to mirror (MAUNDY_APPLE_PLAYLIST_URL)
# playlist_url = "https://music.apple.com/us/playlist/..."

[spotify]
# client_id = ""        # MAUNDY_SPOTIFY_CLIENT_ID
# client_secret = ""    # MAUNDY_SPOTIFY_CLIENT_SECRET
# refresh_token = ""    # MAUNDY_SPOTIFY_REFRESH_TOKEN
# playlist_id = ""      # MAUNDY_SPOTIFY_PLAYLIST_ID

[http]
# Per-request timeout; no timeout when unset
# timeout = "30s"
"#;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub executable: Option<PathBuf>,
    pub settle_interval: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub playlist_url: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub playlist_id: Option<String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout: Option<String>,
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub browser_executable: Option<PathBuf>,
    pub settle_interval: Option<String>,
    pub playlist_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub playlist_id: Option<String>,
    pub http_timeout: Option<String>,
}

/// A mandatory value that was not set anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingValue {
    pub key: &'static str,
    pub env: Option<&'static str>,
}

impl fmt::Display for MissingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.env {
            Some(env) => write!(f, "{} (or {})", self.key, env),
            None => write!(f, "{}", self.key),
        }
    }
}

fn join_missing(missing: &[MissingValue]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration values: {}", join_missing(.0))]
    Missing(Vec<MissingValue>),
    #[error("Invalid duration for {key}: {source}")]
    InvalidDuration {
        key: &'static str,
        source: humantime::DurationError,
    },
}

/// Everything needed to open and scrape the source playlist.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub browser_executable: PathBuf,
    pub settle_interval: Duration,
    pub playlist_url: String,
}

/// Everything needed to talk to the target playlist.
#[derive(Debug, Clone)]
pub struct SpotifySettings {
    pub credentials: SpotifyCredentials,
    pub playlist_id: String,
    pub http_timeout: Option<Duration>,
}

fn require<T: Clone>(
    value: &Option<T>,
    key: &'static str,
    env: Option<&'static str>,
    missing: &mut Vec<MissingValue>,
) -> Option<T> {
    if value.is_none() {
        missing.push(MissingValue { key, env });
    }
    value.clone()
}

fn parse_duration(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value).map_err(|source| ConfigError::InvalidDuration { key, source })
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Default config file location
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("maundy").join("config.toml"))
    }

    /// Load the default config file, or an empty config when there is none
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                log::debug!("No config file found, using environment only");
                Ok(Self::default())
            }
        }
    }

    /// Write the commented template to the default location, keeping any existing file
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_eyre("No config directory available")?;
        Self::write_default(&path)?;
        Ok(path)
    }

    fn write_default(path: &Path) -> Result<()> {
        if path.exists() {
            log::info!("Config file already exists: {}", path.display());
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(path, DEFAULT_CONFIG)
            .wrap_err_with(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Layer command line / environment values on top of the file values.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        fn set<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        set(&mut self.browser.executable, overrides.browser_executable);
        set(&mut self.browser.settle_interval, overrides.settle_interval);
        set(&mut self.source.playlist_url, overrides.playlist_url);
        set(&mut self.spotify.client_id, overrides.client_id);
        set(&mut self.spotify.client_secret, overrides.client_secret);
        set(&mut self.spotify.refresh_token, overrides.refresh_token);
        set(&mut self.spotify.playlist_id, overrides.playlist_id);
        set(&mut self.http.timeout, overrides.http_timeout);
    }

    pub fn source_settings(&self) -> Result<SourceSettings, ConfigError> {
        let mut missing = Vec::new();
        match self.collect_source(&mut missing) {
            Some(settings) if missing.is_empty() => settings,
            _ => Err(ConfigError::Missing(missing)),
        }
    }

    pub fn spotify_settings(&self) -> Result<SpotifySettings, ConfigError> {
        let mut missing = Vec::new();
        match self.collect_spotify(&mut missing) {
            Some(settings) if missing.is_empty() => settings,
            _ => Err(ConfigError::Missing(missing)),
        }
    }

    /// Source and Spotify settings together; every missing value is reported at once.
    ///
    /// Durations are only validated once nothing is missing.
    pub fn sync_settings(&self) -> Result<(SourceSettings, SpotifySettings), ConfigError> {
        let mut missing = Vec::new();
        let source = self.collect_source(&mut missing);
        let spotify = self.collect_spotify(&mut missing);
        match (source, spotify) {
            (Some(source), Some(spotify)) if missing.is_empty() => Ok((source?, spotify?)),
            _ => Err(ConfigError::Missing(missing)),
        }
    }

    fn settle_interval(&self) -> Result<Duration, ConfigError> {
        match &self.browser.settle_interval {
            Some(value) => parse_duration("browser.settle_interval", value),
            None => Ok(DEFAULT_SETTLE_INTERVAL),
        }
    }

    fn http_timeout(&self) -> Result<Option<Duration>, ConfigError> {
        self.http
            .timeout
            .as_deref()
            .map(|value| parse_duration("http.timeout", value))
            .transpose()
    }

    /// `None` when a mandatory value is missing (recorded in `missing`).
    fn collect_source(
        &self,
        missing: &mut Vec<MissingValue>,
    ) -> Option<Result<SourceSettings, ConfigError>> {
        let executable = require(
            &self.browser.executable,
            "browser.executable",
            Some(ENV_BROWSER_PATH),
            missing,
        );
        let url = require(
            &self.source.playlist_url,
            "source.playlist_url",
            Some(ENV_APPLE_PLAYLIST_URL),
            missing,
        );
        let (browser_executable, playlist_url) = (executable?, url?);

        Some(self.settle_interval().map(|settle_interval| SourceSettings {
            browser_executable,
            settle_interval,
            playlist_url,
        }))
    }

    fn collect_spotify(
        &self,
        missing: &mut Vec<MissingValue>,
    ) -> Option<Result<SpotifySettings, ConfigError>> {
        let client_id = require(
            &self.spotify.client_id,
            "spotify.client_id",
            Some(ENV_SPOTIFY_CLIENT_ID),
            missing,
        );
        let client_secret = require(
            &self.spotify.client_secret,
            "spotify.client_secret",
            Some(ENV_SPOTIFY_CLIENT_SECRET),
            missing,
        );
        let refresh_token = require(
            &self.spotify.refresh_token,
            "spotify.refresh_token",
            Some(ENV_SPOTIFY_REFRESH_TOKEN),
            missing,
        );
        let playlist_id = require(
            &self.spotify.playlist_id,
            "spotify.playlist_id",
            Some(ENV_SPOTIFY_PLAYLIST_ID),
            missing,
        );
        let credentials = SpotifyCredentials {
            client_id: client_id?,
            client_secret: client_secret?,
            refresh_token: refresh_token?,
        };
        let playlist_id = playlist_id?;

        Some(self.http_timeout().map(|http_timeout| SpotifySettings {
            credentials,
            playlist_id,
            http_timeout,
        }))
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show<T: fmt::Display>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map_or("<unset>".to_string(), |value| value.to_string())
        }
        fn redact<T>(value: &Option<T>) -> &'static str {
            if value.is_some() { "[REDACTED]" } else { "<unset>" }
        }

        writeln!(
            f,
            "browser.executable = {}",
            show(&self.browser.executable.as_ref().map(|p| p.display()))
        )?;
        writeln!(
            f,
            "browser.settle_interval = {}",
            show(&self.browser.settle_interval)
        )?;
        writeln!(f, "source.playlist_url = {}", show(&self.source.playlist_url))?;
        writeln!(f, "spotify.client_id = {}", show(&self.spotify.client_id))?;
        writeln!(
            f,
            "spotify.client_secret = {}",
            redact(&self.spotify.client_secret)
        )?;
        writeln!(
            f,
            "spotify.refresh_token = {}",
            redact(&self.spotify.refresh_token)
        )?;
        writeln!(f, "spotify.playlist_id = {}", show(&self.spotify.playlist_id))?;
        write!(f, "http.timeout = {}", show(&self.http.timeout))
    }
}
