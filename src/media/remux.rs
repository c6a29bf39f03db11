use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::{Error, Res};

/// Repackages an audio stream into another container without re-encoding.
#[allow(async_fn_in_trait)]
pub trait Remuxer {
    async fn remux(&self, input: &Path, output: &Path) -> Res<()>;
}

/// Remuxer backed by an `ffmpeg` binary.
pub struct FfmpegRemuxer {
    binary_path: PathBuf,
}

impl FfmpegRemuxer {
    /// `binary_path` comes from `SCDL_FFMPEG` or a `PATH` lookup, see
    /// [`crate::config::Settings`].
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }
}

impl Remuxer for FfmpegRemuxer {
    async fn remux(&self, input: &Path, output: &Path) -> Res<()> {
        let output_status = Command::new(&self.binary_path)
            .args(["-loglevel", "error", "-y", "-i"])
            .arg(input)
            .args(["-c:a", "copy"])
            .arg(output)
            .output()
            .await
            .map_err(|e| Error::Mux(format!("failed to execute ffmpeg: {e}")))?;

        if !output_status.status.success() {
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            return Err(Error::Mux(format!(
                "ffmpeg exited with {}: {}",
                output_status.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}
