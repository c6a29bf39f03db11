use std::{
    fmt,
    path::{Path, PathBuf},
};

use tabled::Table;

use crate::{
    Error, Res,
    config::DEFAULT_TRACK_TEMPLATE,
    error::Gate,
    info,
    management::ScratchDir,
    media::{
        DirectDownloader, Remuxer, SegmentAssembler, Tagger,
        selector::{
            self, Choice, Entitlement, Protocol, QualityTier, RetrievalPlan, Source,
            TrackMetadata,
        },
    },
    soundcloud::Client,
    success,
    types::{BatchReportRow, Track},
    utils::{self, Metadata},
    warning,
};

#[derive(Debug)]
pub enum SkipReason {
    NotDownloadable(Gate),
    AlreadyExists(PathBuf),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotDownloadable(gate) => write!(f, "not downloadable: {gate}"),
            SkipReason::AlreadyExists(_) => f.write_str("already exists"),
        }
    }
}

/// Terminal outcome of one track.
#[derive(Debug)]
pub enum AcquisitionResult {
    Success(PathBuf),
    /// The audio file is in place but its tags could not be written.
    Untagged { path: PathBuf, error: Error },
    Skipped(SkipReason),
    Failed(Error),
}

impl AcquisitionResult {
    /// True for every outcome that left a finished file, tagged or not.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            AcquisitionResult::Success(_) | AcquisitionResult::Untagged { .. }
        )
    }

    pub fn is_untagged(&self) -> bool {
        matches!(self, AcquisitionResult::Untagged { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, AcquisitionResult::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AcquisitionResult::Failed(_))
    }
}

impl fmt::Display for AcquisitionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionResult::Success(path) => write!(f, "downloaded {}", path.display()),
            AcquisitionResult::Untagged { path, error } => write!(
                f,
                "downloaded {} (tags not written: {error})",
                path.display()
            ),
            AcquisitionResult::Skipped(reason) => write!(f, "skipped: {reason}"),
            AcquisitionResult::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// Where a collection goes and how its files are named.
pub struct CollectionContext<'a> {
    pub folder: &'a Path,
    pub album: &'a Metadata,
    pub template: &'a str,
    /// Fixed track number, used when a single track is downloaded out of a set.
    pub number_override: Option<u32>,
    /// Artwork for the collection; fetched at most once.
    pub artwork_url: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct AcquisitionOptions {
    pub tier: QualityTier,
    pub entitlement: Entitlement,
    pub keep_cover: bool,
}

/// Per-collection results, in listing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Size of the collection the track numbers count against.
    pub total: u32,
    pub entries: Vec<(u32, String, AcquisitionResult)>,
}

impl BatchReport {
    pub fn downloaded(&self) -> usize {
        self.entries.iter().filter(|(_, _, r)| r.is_success()).count()
    }

    pub fn untagged(&self) -> usize {
        self.entries.iter().filter(|(_, _, r)| r.is_untagged()).count()
    }

    pub fn skipped(&self) -> usize {
        self.entries.iter().filter(|(_, _, r)| r.is_skipped()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|(_, _, r)| r.is_failed()).count()
    }

    pub fn print(&self) {
        if self.entries.len() > 1 {
            let rows: Vec<BatchReportRow> = self
                .entries
                .iter()
                .map(|(number, title, result)| BatchReportRow {
                    track: format!("{number}/{}", self.total),
                    title: title.clone(),
                    outcome: result.to_string(),
                })
                .collect();
            println!("{}", Table::new(rows));
        }
        success!(
            "{} downloaded, {} skipped, {} failed.",
            self.downloaded(),
            self.skipped(),
            self.failed()
        );
        if self.untagged() > 0 {
            warning!("{} downloaded without tags.", self.untagged());
        }
    }
}

enum Cover {
    Pending,
    Fetched { path: PathBuf, data: Vec<u8> },
    Unavailable,
}

/// Drives selection and acquisition for the tracks of one collection.
///
/// Tracks are processed one at a time in listing order. Every error a track
/// raises is caught here and recorded in its [`AcquisitionResult`]; nothing a
/// single track does aborts the collection.
pub struct AcquisitionOrchestrator<'a, M: Remuxer, T: Tagger> {
    client: &'a Client,
    remuxer: &'a M,
    tagger: &'a T,
    scratch: &'a ScratchDir,
    options: AcquisitionOptions,
}

impl<'a, M: Remuxer, T: Tagger> AcquisitionOrchestrator<'a, M, T> {
    pub fn new(
        client: &'a Client,
        remuxer: &'a M,
        tagger: &'a T,
        scratch: &'a ScratchDir,
        options: AcquisitionOptions,
    ) -> Self {
        Self {
            client,
            remuxer,
            tagger,
            scratch,
            options,
        }
    }

    /// Processes every track of a collection and removes the cover afterwards
    /// unless it should be kept.
    pub async fn process_collection(
        &self,
        tracks: &[Track],
        ctx: &CollectionContext<'_>,
    ) -> BatchReport {
        let total = ctx.album.tracktotal.max(tracks.len() as u32);
        let mut report = BatchReport {
            total,
            entries: Vec::new(),
        };
        let mut cover = Cover::Pending;

        for (index, track) in tracks.iter().enumerate() {
            let number = ctx.number_override.unwrap_or(index as u32 + 1);
            let result = self
                .process_track(track, ctx, number, total, &mut cover)
                .await;
            report
                .entries
                .push((number, track.title().to_string(), result));
        }

        if let Cover::Fetched { path, .. } = cover {
            if !self.options.keep_cover {
                if let Err(e) = async_fs::remove_file(&path).await {
                    warning!("Failed to remove cover {}: {}", path.display(), e);
                }
            }
        }

        report
    }

    async fn process_track(
        &self,
        track: &Track,
        ctx: &CollectionContext<'_>,
        number: u32,
        total: u32,
        cover: &mut Cover,
    ) -> AcquisitionResult {
        let title = track.title().to_string();
        match self.acquire(track, ctx, number, total, cover).await {
            Ok(result) => {
                match &result {
                    AcquisitionResult::Skipped(reason) => {
                        warning!("Track {} of {} ({}) skipped: {}", number, total, title, reason);
                    }
                    AcquisitionResult::Untagged { error, .. } => {
                        warning!("Failed to write tags for {}: {}", title, error);
                    }
                    _ => {}
                }
                result
            }
            Err(e) => {
                warning!("Track {} of {} ({}) failed: {}", number, total, title, e);
                AcquisitionResult::Failed(e)
            }
        }
    }

    async fn acquire(
        &self,
        track: &Track,
        ctx: &CollectionContext<'_>,
        number: u32,
        total: u32,
        cover: &mut Cover,
    ) -> Res<AcquisitionResult> {
        let metadata = TrackMetadata::from(track);
        let choice =
            match selector::choose(&metadata, self.options.tier, self.options.entitlement) {
                Ok(choice) => choice,
                Err(Error::NotDownloadable(gate)) => {
                    return Ok(AcquisitionResult::Skipped(SkipReason::NotDownloadable(gate)));
                }
                Err(e) => return Err(e),
            };

        let tags = ctx.album.with_track(track, number);
        let name = utils::parse_template(&tags.values(), ctx.template, DEFAULT_TRACK_TEMPLATE);

        let existing = match &choice {
            Choice::Hls(rendition) => {
                let path = ctx
                    .folder
                    .join(format!("{name}{}", rendition.family.extension()));
                path.is_file().then_some(path)
            }
            Choice::Direct { .. } => find_with_stem(ctx.folder, &name).await,
        };
        if let Some(path) = existing {
            return Ok(AcquisitionResult::Skipped(SkipReason::AlreadyExists(path)));
        }

        let cover_data = match choice.protocol() {
            Protocol::Direct => None,
            Protocol::HlsSegmented => self.cover(cover, ctx).await,
        };

        let plan = selector::resolve(choice, self.client).await?;
        let final_path = ctx.folder.join(format!("{name}{}", plan.extension));
        let transient_path = ctx.folder.join(format!("{number}{}", plan.extension));

        info!(
            "Downloading track {} of {}: {} - {}",
            number,
            total,
            track.title(),
            plan.display_label
        );

        if let Err(e) = self.fetch(track, &plan, &transient_path).await {
            discard(&transient_path).await;
            return Err(e);
        }

        let tag_error = match plan.protocol() {
            Protocol::Direct => None,
            Protocol::HlsSegmented => self
                .tagger
                .write(&tags, &transient_path, &plan.extension, cover_data.as_deref())
                .err(),
        };

        if let Err(source) = async_fs::rename(&transient_path, &final_path).await {
            return Err(Error::Rename {
                from: transient_path,
                to: final_path,
                source,
            });
        }

        Ok(match tag_error {
            Some(error) => AcquisitionResult::Untagged {
                path: final_path,
                error,
            },
            None => AcquisitionResult::Success(final_path),
        })
    }

    /// Writes the audio of `plan` to `output`.
    async fn fetch(&self, track: &Track, plan: &RetrievalPlan, output: &Path) -> Res<()> {
        match &plan.source {
            Source::Direct(download) => {
                DirectDownloader::new(self.client.cdn())
                    .download(&download.url, output)
                    .await?;
                Ok(())
            }
            Source::Hls(rendition) => {
                let scratch_path = self.scratch.next_path(track.id);
                SegmentAssembler::new(self.client, self.remuxer)
                    .assemble(&rendition.locator, &scratch_path, output)
                    .await
            }
        }
    }

    /// Cover bytes for the collection, fetched on first use and written next
    /// to the tracks as `cover.jpg`.
    async fn cover(&self, cover: &mut Cover, ctx: &CollectionContext<'_>) -> Option<Vec<u8>> {
        if let Cover::Pending = cover {
            *cover = match self.fetch_cover(ctx).await {
                Ok(Some((path, data))) => Cover::Fetched { path, data },
                Ok(None) => Cover::Unavailable,
                Err(e) => {
                    warning!("Failed to write cover: {}", e);
                    Cover::Unavailable
                }
            };
        }

        match cover {
            Cover::Fetched { data, .. } => Some(data.clone()),
            _ => None,
        }
    }

    async fn fetch_cover(&self, ctx: &CollectionContext<'_>) -> Res<Option<(PathBuf, Vec<u8>)>> {
        let Some(artwork_url) = ctx.artwork_url.as_deref() else {
            return Ok(None);
        };

        let data = self.client.fetch_bytes(&full_size_artwork(artwork_url)).await?;
        let path = ctx.folder.join("cover.jpg");
        async_fs::write(&path, &data).await?;
        Ok(Some((path, data)))
    }
}

/// Swaps the `large` size suffix of an artwork URL for the 500x500 variant.
pub fn full_size_artwork(url: &str) -> String {
    match url.strip_suffix("large.jpg") {
        Some(prefix) => format!("{prefix}t500x500.jpg"),
        None => url.to_string(),
    }
}

/// Removes a partially written file so it never looks like a finished track.
async fn discard(path: &Path) {
    match async_fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warning!("Failed to remove {}: {}", path.display(), e),
    }
}

/// First file in `folder` whose name without extension is `stem`.
async fn find_with_stem(folder: &Path, stem: &str) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(folder).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.is_file() && path.file_stem().and_then(|s| s.to_str()) == Some(stem) {
            return Some(path);
        }
    }
    None
}
