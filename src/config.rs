//! Configuration management for the SoundCloud downloader.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. Command-line flags are applied on top of the
//! values collected here, so the resolution order is:
//! 1. Command-line flags (highest priority)
//! 2. Environment variables
//! 3. `.env` file in the local data directory
//! 4. Application defaults

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::{Error, Res, media::QualityTier};

pub const DEFAULT_TRACK_TEMPLATE: &str = "{trackpadded}. {title}";
pub const DEFAULT_COLLECTION_TEMPLATE: &str = "{albumartist} - {album}";
pub const DEFAULT_ARTIST_TEMPLATE: &str = "{username}";

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the necessary directory structure if it doesn't exist and loads
/// environment variables from `scdlcli/.env` below the platform-specific
/// local data directory. A missing file is not an error: every setting has a
/// default.
///
/// # Directory Structure
///
/// The function looks for the `.env` file in:
/// - Linux: `~/.local/share/scdlcli/.env`
/// - macOS: `~/Library/Application Support/scdlcli/.env`
/// - Windows: `%LOCALAPPDATA%/scdlcli/.env`
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the `.env` file
/// exists but cannot be parsed.
pub async fn load_env() -> Res<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path)
            .map_err(|e| Error::Config(format!("cannot load {}: {}", path.display(), e)))?;
    }
    Ok(())
}

/// Returns the application's local data directory (`<data_local_dir>/scdlcli`).
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("scdlcli");
    path
}

/// Base URL of the SoundCloud v2 API.
pub fn api_url() -> String {
    env::var("SCDL_API_URL").unwrap_or_else(|_| "https://api-v2.soundcloud.com".to_string())
}

/// Base URL of the SoundCloud website, used for profile scraping and client id discovery.
pub fn web_url() -> String {
    env::var("SCDL_WEB_URL").unwrap_or_else(|_| "https://soundcloud.com".to_string())
}

/// Path to the Netscape-format cookie export.
pub fn cookies_path() -> PathBuf {
    env::var("SCDL_COOKIES_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("cookies.txt"))
}

/// Client id and app version overrides. Both must be set to take effect.
pub fn client_identity_override() -> Option<(String, String)> {
    let client_id = env::var("SCDL_CLIENT_ID").ok()?;
    let app_version = env::var("SCDL_APP_VERSION").ok()?;
    Some((app_version, client_id))
}

/// Runtime settings for a download run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub quality: QualityTier,
    pub output_path: PathBuf,
    pub template: String,
    pub keep_cover: bool,
    pub set_folder_template: String,
    pub track_folder_template: String,
    pub artist_folder_template: String,
    pub likes_folder: String,
    pub scratch_dir: PathBuf,
    pub ffmpeg: Option<PathBuf>,
    pub page_delay: Duration,
}

impl Settings {
    /// Collects settings from the environment, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a variable is set but cannot be parsed,
    /// e.g. `SCDL_QUALITY=7`.
    pub fn from_env() -> Res<Self> {
        let quality: u8 = parse_var("SCDL_QUALITY", 3)?;
        let quality = QualityTier::try_from(quality)?;

        Ok(Self {
            quality,
            output_path: var_or("SCDL_OUTPUT_PATH", "downloads").into(),
            template: var_or("SCDL_TEMPLATE", DEFAULT_TRACK_TEMPLATE),
            keep_cover: parse_var("SCDL_KEEP_COVER", false)?,
            set_folder_template: var_or("SCDL_SET_FOLDER_TEMPLATE", DEFAULT_COLLECTION_TEMPLATE),
            track_folder_template: var_or(
                "SCDL_TRACK_FOLDER_TEMPLATE",
                DEFAULT_COLLECTION_TEMPLATE,
            ),
            artist_folder_template: var_or("SCDL_ARTIST_FOLDER_TEMPLATE", DEFAULT_ARTIST_TEMPLATE),
            likes_folder: var_or("SCDL_LIKES_FOLDER", "Likes"),
            scratch_dir: env::var("SCDL_SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir().join("tmp")),
            ffmpeg: env::var("SCDL_FFMPEG")
                .map(PathBuf::from)
                .ok()
                .or_else(|| which::which("ffmpeg").ok()),
            page_delay: Duration::from_millis(parse_var("SCDL_PAGE_DELAY_MS", 200)?),
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Res<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}
