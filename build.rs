//! Build script for the SoundCloud downloader CLI.
//!
//! Copies the configuration template to the user's local data directory so
//! that it sits next to the `.env` file the application reads at start-up.

use std::{env, fs, path::PathBuf};

/// Copies `.env.example` from the crate root to `<data_local_dir>/scdlcli/`.
///
/// # Destination
///
/// - Linux: `~/.local/share/scdlcli/.env.example`
/// - macOS: `~/Library/Application Support/scdlcli/.env.example`
/// - Windows: `%LOCALAPPDATA%/scdlcli/.env.example`
///
/// A missing template only produces a cargo warning; failing to create the
/// directory or write the copy fails the build.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=.env.example");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let env_example_path = manifest_dir.join(".env.example");

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("scdlcli");
    fs::create_dir_all(&out_dir)?;

    if env_example_path.is_file() {
        fs::copy(&env_example_path, out_dir.join(".env.example"))?;
    } else {
        println!(
            "cargo:warning=.env.example not found at {}",
            env_example_path.display()
        );
    }

    Ok(())
}
