//! Error types for scdlcli.
//!
//! One enum covers the whole crate. The acquisition variants (`Transport`,
//! `NotDownloadable`, `UnavailableAtTier`, `Manifest`, `SegmentFetch`, `Mux`,
//! `Rename`) are the ones the download pipeline produces and the batch loop
//! turns into per-track results; the remaining variants belong to start-up,
//! configuration and metadata handling.

use std::{fmt, path::PathBuf};

use thiserror::Error;

use crate::media::QualityTier;

/// Reason a track failed the entitlement checks.
///
/// The checks run in declaration order and the first failing one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    NotStreamable,
    RequiresHighTier,
    RegionBlocked,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Gate::NotStreamable => "track is not streamable",
            Gate::RequiresHighTier => "track requires an active Go+ subscription",
            Gate::RegionBlocked => "track is unavailable in your region",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Network or HTTP failure. Never retried at this layer.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("not downloadable: {0}")]
    NotDownloadable(Gate),

    #[error("unavailable at quality {tier}")]
    UnavailableAtTier { tier: QualityTier },

    #[error("manifest error: {0}")]
    Manifest(String),

    /// Segment `index` counts the initialization segment as 0 when present.
    #[error("failed to fetch segment {index}: {source}")]
    SegmentFetch {
        index: usize,
        #[source]
        source: reqwest::Error,
    },

    #[error("remux failed: {0}")]
    Mux(String),

    #[error("failed to rename {} to {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tag error: {0}")]
    Tag(#[from] lofty::error::LoftyError),

    /// The API answered with something we cannot use.
    #[error("unexpected API response: {0}")]
    Api(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unknown template key: {0}")]
    Template(String),
}
