use std::{path::Path, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use m3u8_rs::MediaPlaylist;
use reqwest::header::RANGE;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

use crate::{
    Error, Res,
    media::{Remuxer, direct::CHUNK_SIZE},
    soundcloud::Client,
};

/// Ordered segment URIs of one stream, absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentManifest {
    pub init: Option<String>,
    pub segments: Vec<String>,
}

impl SegmentManifest {
    /// Parses a media playlist and resolves every URI against `playlist_url`.
    ///
    /// The initialization segment comes from the first segment's `EXT-X-MAP`
    /// or, when the tag precedes all segments, from the playlist-level tag.
    ///
    /// # Errors
    ///
    /// [`Error::Manifest`] if the body is not a media playlist or a URI
    /// cannot be resolved.
    pub fn parse(playlist_url: &str, body: &str) -> Res<Self> {
        let playlist = m3u8_rs::parse_media_playlist_res(body.as_bytes())
            .map_err(|e| Error::Manifest(format!("cannot parse playlist: {e:?}")))?;

        let base = Url::parse(playlist_url)
            .map_err(|e| Error::Manifest(format!("invalid playlist URL {playlist_url}: {e}")))?;
        let absolute = |uri: &str| -> Res<String> {
            base.join(uri)
                .map(|u| u.to_string())
                .map_err(|e| Error::Manifest(format!("cannot resolve segment {uri}: {e}")))
        };

        let init_uri = playlist
            .segments
            .first()
            .and_then(|s| s.map.as_ref())
            .map(|m| m.uri.clone())
            .or_else(|| playlist_level_map_uri(&playlist));

        let init = init_uri.as_deref().map(absolute).transpose()?;
        let segments = playlist
            .segments
            .iter()
            .map(|s| absolute(&s.uri))
            .collect::<Res<Vec<_>>>()?;

        if segments.is_empty() {
            return Err(Error::Manifest("playlist has no segments".to_string()));
        }

        Ok(Self { init, segments })
    }

    /// Init segment first, then stream segments, in manifest order.
    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.init
            .iter()
            .chain(self.segments.iter())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.segments.len() + usize::from(self.init.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// m3u8-rs keeps an `EXT-X-MAP` written before the first segment as an
/// unknown tag.
fn playlist_level_map_uri(playlist: &MediaPlaylist) -> Option<String> {
    let tag = playlist.unknown_tags.iter().find(|t| t.tag == "X-MAP")?;
    let rest = tag.rest.as_deref()?;
    let start = rest.find("URI=\"")? + "URI=\"".len();
    let end = rest[start..].find('"')? + start;
    Some(rest[start..end].to_string())
}

/// Downloads a segmented stream into one file and remuxes it.
pub struct SegmentAssembler<'a, M: Remuxer> {
    client: &'a Client,
    remuxer: &'a M,
}

impl<'a, M: Remuxer> SegmentAssembler<'a, M> {
    pub fn new(client: &'a Client, remuxer: &'a M) -> Self {
        Self { client, remuxer }
    }

    /// Fetches the manifest behind `transcoding_url`, writes every segment in
    /// order to `scratch_path` and remuxes it into `output_path`.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] if the manifest indirection fails
    /// - [`Error::Manifest`] if the playlist cannot be parsed
    /// - [`Error::SegmentFetch`] if a segment request fails; the scratch file
    ///   keeps every segment written before it and the remuxer is not run
    /// - [`Error::Mux`] if the remuxer fails
    pub async fn assemble(
        &self,
        transcoding_url: &str,
        scratch_path: &Path,
        output_path: &Path,
    ) -> Res<()> {
        let playlist = self.client.stream_playlist(transcoding_url).await?;
        let manifest = SegmentManifest::parse(&playlist.url, &playlist.body)?;

        self.download_segments(&manifest, scratch_path).await?;
        self.remuxer.remux(scratch_path, output_path).await
    }

    /// Streams each segment, in order, into a single container file.
    pub async fn download_segments(&self, manifest: &SegmentManifest, path: &Path) -> Res<()> {
        let pb = ProgressBar::new(manifest.len() as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{bar:40.blue} {pos}/{len} segments [{elapsed_precise}<{eta_precise}]",
        ) {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(250));

        let file = tokio::fs::File::create(path).await?;
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);

        let written = self.write_segments(manifest, &mut writer, &pb).await;
        let flushed = writer.flush().await;
        pb.finish_and_clear();

        written?;
        flushed?;
        Ok(())
    }

    async fn write_segments(
        &self,
        manifest: &SegmentManifest,
        writer: &mut BufWriter<tokio::fs::File>,
        pb: &ProgressBar,
    ) -> Res<()> {
        for (index, uri) in manifest.uris().enumerate() {
            let fetch_error = |source| Error::SegmentFetch { index, source };

            let mut response = self
                .client
                .cdn()
                .get(uri)
                .header(RANGE, "bytes=0-")
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(fetch_error)?;

            while let Some(chunk) = response.chunk().await.map_err(fetch_error)? {
                writer.write_all(&chunk).await?;
            }
            pb.inc(1);
        }
        Ok(())
    }
}
