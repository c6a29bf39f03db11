use std::{path::Path, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::RANGE;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::Res;

/// Write buffer size for streamed downloads.
pub const CHUNK_SIZE: usize = 32 * 1024;

/// Streams a single HTTP resource to disk.
pub struct DirectDownloader<'a> {
    http: &'a reqwest::Client,
}

impl<'a> DirectDownloader<'a> {
    pub fn new(http: &'a reqwest::Client) -> Self {
        Self { http }
    }

    /// Downloads `url` into `output_path`, returning the number of bytes written.
    ///
    /// Progress is shown in bytes against `Content-Length`; without that
    /// header a spinner counts bytes instead.
    pub async fn download(&self, url: &str, output_path: &Path) -> Res<u64> {
        let mut response = self
            .http
            .get(url)
            .header(RANGE, "bytes=0-")
            .send()
            .await?
            .error_for_status()?;

        let pb = match response.content_length() {
            Some(total) => {
                let pb = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::with_template(
                    "{bar:40.blue} {bytes}/{total_bytes} [{elapsed_precise}<{eta_precise}, {binary_bytes_per_sec}]",
                ) {
                    pb.set_style(style);
                }
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {bytes} [{elapsed_precise}]") {
                    pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
                }
                pb
            }
        };
        pb.enable_steady_tick(Duration::from_millis(250));

        let file = tokio::fs::File::create(output_path).await?;
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
        let mut written: u64 = 0;

        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e.into());
                }
            };
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
            pb.set_position(written);
        }

        writer.flush().await?;
        pb.finish_and_clear();
        Ok(written)
    }
}
