//! SoundCloud Downloader CLI Library
//!
//! This library provides functionality for downloading tracks, sets, artist
//! listings and liked tracks from SoundCloud. It resolves platform metadata
//! through a cookie-authenticated API client, picks one audio rendition per
//! track under a quality policy, reassembles segmented streams or follows the
//! direct download link, writes tags and files the result under a templated
//! name.
//!
//! # Modules
//!
//! - `cli` - Command-line command implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by every module
//! - `management` - Local state: cookies, cached client id, scratch files
//! - `media` - Rendition selection and audio acquisition
//! - `soundcloud` - SoundCloud API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - URL intake, metadata mapping and filename templates
//!
//! # Example
//!
//! ```
//! use scdlcli::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> scdlcli::Res<()> {
//!     config::load_env().await?;
//!     // Use CLI functions...
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod media;
pub mod soundcloud;
pub mod types;
pub mod utils;

pub use error::Error;

/// A convenient Result type alias for operations that may fail.
///
/// Every fallible operation in the crate reports an [`Error`], so callers can
/// match on the failure kind (for example to tell a skipped track from a
/// broken one) instead of inspecting strings.
///
/// # Type Parameters
///
/// - `T` - The success type returned on successful operations
///
/// # Example
///
/// ```
/// use scdlcli::Res;
///
/// async fn fetch_data() -> Res<String> {
///     Ok("data".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, Error>;

/// Prints an informational message with a blue bullet point.
///
/// Creates a formatted output line with a distinctive blue "o" indicator
/// followed by the provided message. Used for general information and
/// status updates throughout the application.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Example
///
/// ```
/// info!("Item {} of {}:", num, total);
/// info!("Downloading track {} of {}", num, total);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// Creates a formatted output line with a green "✓" indicator to signify
/// successful completion of operations.
///
/// # Example
///
/// ```
/// success!("Signed in successfully - {} account.", plan);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Creates a formatted error output with a red "!" indicator and immediately
/// terminates the program with exit code 1. Only used for start-up failures
/// where nothing useful can be downloaded; failures of a single track or URL
/// are reported with [`warning!`] so the batch keeps going.
///
/// # Example
///
/// ```
/// error!("Failed to read cookies: {}", e);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues: a skipped or failed track, a URL whose
/// processing aborted, a cover that could not be fetched.
///
/// # Example
///
/// ```
/// warning!("Track {} of {} failed: {}", num, total, e);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
