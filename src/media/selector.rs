use std::fmt;

use crate::{
    Error, Res,
    error::Gate,
    soundcloud::{Client, DirectDownload},
    types::{MonetizationModel, Policy, Track},
};

/// Requested quality, 1 to 4.
///
/// `Best` prefers the uploader's original file (download button) over any
/// transcode when the track offers one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QualityTier {
    Opus = 1,
    Mp3 = 2,
    Aac = 3,
    Best = 4,
}

impl TryFrom<u8> for QualityTier {
    type Error = Error;

    fn try_from(value: u8) -> Res<Self> {
        match value {
            1 => Ok(QualityTier::Opus),
            2 => Ok(QualityTier::Mp3),
            3 => Ok(QualityTier::Aac),
            4 => Ok(QualityTier::Best),
            other => Err(Error::Config(format!(
                "quality must be between 1 and 4, got {other}"
            ))),
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QualityTier::Opus => "1 (64 Kbps OPUS)",
            QualityTier::Mp3 => "2 (128 Kbps MP3)",
            QualityTier::Aac => "3 (256 Kbps AAC)",
            QualityTier::Best => "4 (best/download)",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimeFamily {
    OpusLow,
    Mp3Mid,
    AacHigh,
}

impl MimeFamily {
    /// Maps a transcoding mime type (parameters ignored) to its family.
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        match mime_type.split(';').next().map(str::trim) {
            Some("audio/ogg") => Some(MimeFamily::OpusLow),
            Some("audio/mpeg") => Some(MimeFamily::Mp3Mid),
            Some("audio/mp4") => Some(MimeFamily::AacHigh),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MimeFamily::OpusLow => ".ogg",
            MimeFamily::Mp3Mid => ".mp3",
            MimeFamily::AacHigh => ".m4a",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MimeFamily::OpusLow => "64 Kbps OPUS",
            MimeFamily::Mp3Mid => "128 Kbps MP3",
            MimeFamily::AacHigh => "256 Kbps AAC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    HlsSegmented,
    Direct,
}

/// One segmented transcode of a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    pub family: MimeFamily,
    pub locator: String,
}

/// The fields of a track that decide how (and whether) it can be acquired.
#[derive(Debug, Clone)]
pub struct TrackMetadata {
    pub id: u64,
    pub streamable: bool,
    pub monetization_model: Option<MonetizationModel>,
    pub policy: Option<Policy>,
    pub downloadable: bool,
    pub has_downloads_left: bool,
    pub renditions: Vec<Rendition>,
}

impl From<&Track> for TrackMetadata {
    fn from(track: &Track) -> Self {
        let mut renditions: Vec<Rendition> = Vec::new();
        let transcodings = track.media.iter().flat_map(|m| m.transcodings.iter());
        for transcoding in transcodings {
            if transcoding.format.protocol != "hls" {
                continue;
            }
            let Some(family) = MimeFamily::from_mime_type(&transcoding.format.mime_type) else {
                continue;
            };
            if renditions.iter().any(|r| r.family == family) {
                continue;
            }
            renditions.push(Rendition {
                family,
                locator: transcoding.url.clone(),
            });
        }

        Self {
            id: track.id,
            streamable: track.streamable,
            monetization_model: track.monetization_model,
            policy: track.policy,
            downloadable: track.downloadable,
            has_downloads_left: track.has_downloads_left,
            renditions,
        }
    }
}

impl TrackMetadata {
    pub fn rendition(&self, family: MimeFamily) -> Option<&Rendition> {
        self.renditions.iter().find(|r| r.family == family)
    }

    pub fn direct_download_available(&self) -> bool {
        self.downloadable && self.has_downloads_left
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Entitlement {
    pub is_high_tier_subscriber: bool,
}

/// The selector's decision before any network round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Hls(Rendition),
    Direct { track_id: u64 },
}

impl Choice {
    pub fn protocol(&self) -> Protocol {
        match self {
            Choice::Hls(_) => Protocol::HlsSegmented,
            Choice::Direct { .. } => Protocol::Direct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Hls(Rendition),
    Direct(DirectDownload),
}

/// How one track will be retrieved. Built once per track and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalPlan {
    pub source: Source,
    pub extension: String,
    pub display_label: String,
}

impl RetrievalPlan {
    pub fn protocol(&self) -> Protocol {
        match self.source {
            Source::Hls(_) => Protocol::HlsSegmented,
            Source::Direct(_) => Protocol::Direct,
        }
    }
}

/// Resolves the download button of a track. Implemented by [`Client`].
#[allow(async_fn_in_trait)]
pub trait DownloadResolver {
    async fn download_link(&self, track_id: u64) -> Res<DirectDownload>;
}

impl DownloadResolver for Client {
    async fn download_link(&self, track_id: u64) -> Res<DirectDownload> {
        Client::download_link(self, track_id).await
    }
}

/// Runs the entitlement checks in their fixed order; the first failure wins.
pub fn check_gates(track: &TrackMetadata, entitlement: Entitlement) -> Result<(), Gate> {
    if !track.streamable {
        return Err(Gate::NotStreamable);
    }
    if track.monetization_model == Some(MonetizationModel::SubHighTier)
        && !entitlement.is_high_tier_subscriber
    {
        return Err(Gate::RequiresHighTier);
    }
    if track.policy == Some(Policy::Block) {
        return Err(Gate::RegionBlocked);
    }
    Ok(())
}

/// Picks a retrieval path without touching the network.
///
/// | tier | choice |
/// |------|--------|
/// | 1 | OPUS, no fallback |
/// | 2 | MP3 |
/// | 3 | AAC, else MP3 |
/// | 4 | download button if allowed, else AAC, else MP3 |
///
/// # Errors
///
/// - [`Error::NotDownloadable`] when a gate check fails
/// - [`Error::UnavailableAtTier`] when the tier has no matching rendition
pub fn choose(track: &TrackMetadata, tier: QualityTier, entitlement: Entitlement) -> Res<Choice> {
    check_gates(track, entitlement).map_err(Error::NotDownloadable)?;

    let unavailable = || Error::UnavailableAtTier { tier };
    let aac_or_mp3 = || {
        track
            .rendition(MimeFamily::AacHigh)
            .or_else(|| track.rendition(MimeFamily::Mp3Mid))
    };

    let rendition = match tier {
        QualityTier::Opus => track.rendition(MimeFamily::OpusLow),
        QualityTier::Mp3 => track.rendition(MimeFamily::Mp3Mid),
        QualityTier::Aac => aac_or_mp3(),
        QualityTier::Best => {
            if track.direct_download_available() {
                return Ok(Choice::Direct { track_id: track.id });
            }
            aac_or_mp3()
        }
    };

    rendition
        .cloned()
        .map(Choice::Hls)
        .ok_or_else(unavailable)
}

/// Turns a choice into a plan, resolving the download redirect if needed.
pub async fn resolve<R: DownloadResolver>(choice: Choice, resolver: &R) -> Res<RetrievalPlan> {
    match choice {
        Choice::Hls(rendition) => Ok(RetrievalPlan {
            extension: rendition.family.extension().to_string(),
            display_label: rendition.family.label().to_string(),
            source: Source::Hls(rendition),
        }),
        Choice::Direct { track_id } => {
            let download = resolver.download_link(track_id).await?;
            Ok(RetrievalPlan {
                extension: download.extension.clone(),
                display_label: format!("{} (download button)", download.filename),
                source: Source::Direct(download),
            })
        }
    }
}

/// Gating, tier selection and redirect resolution in one call.
pub async fn select<R: DownloadResolver>(
    track: &TrackMetadata,
    tier: QualityTier,
    entitlement: Entitlement,
    resolver: &R,
) -> Res<RetrievalPlan> {
    let choice = choose(track, tier, entitlement)?;
    resolve(choice, resolver).await
}
