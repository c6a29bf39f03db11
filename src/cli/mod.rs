//! # CLI Module
//!
//! This module is the command-line layer of scdlcli. It turns the URLs handed
//! to `scdlcli download` into collections of tracks and passes those to the
//! acquisition orchestrator in [`crate::media`].
//!
//! ## Commands
//!
//! - [`download`] - signs in with the exported browser cookies and downloads
//!   every URL in turn
//! - [`client_id`] - scrapes a fresh web client id and caches it
//!
//! ## URL Kinds
//!
//! Every URL is matched against [`MediaKind::from_url`] before anything is
//! requested:
//!
//! | URL | kind | output |
//! |-----|------|--------|
//! | `/<user>/sets/<set>` | [`MediaKind::Set`] | one folder for the set |
//! | `/<user>/<track>` (optionally `?in=<user>/sets/<set>`) | [`MediaKind::Track`] | one folder for the track |
//! | `/<user>/albums` | [`MediaKind::Albums`] | a folder per album below the artist folder |
//! | `/<user>/tracks` | [`MediaKind::Tracks`] | a folder per track below the artist folder |
//! | `/you/likes` | [`MediaKind::Likes`] | a folder per track below the likes folder |
//!
//! URLs that match none of these are reported as invalid and skipped.
//!
//! ## Failure Isolation
//!
//! Failures are contained at two levels. A track that cannot be downloaded
//! is recorded in its collection's report and the collection carries on. A
//! URL whose listing cannot be fetched is reported as a failed item and the
//! next URL starts. The scratch directory is emptied after every URL either
//! way.
//!
//! ## Usage
//!
//! ```bash
//! scdlcli download -u https://soundcloud.com/artist/sets/album
//! scdlcli download -u urls.txt -q 4 -o ~/Music
//! scdlcli client-id
//! ```

mod client_id;
mod collections;
mod download;

pub use client_id::client_id;
pub use download::{DownloadOptions, Session, download};

use crate::{Res, utils};

/// What a SoundCloud URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Track,
    Set,
    Albums,
    Tracks,
    Likes,
}

impl MediaKind {
    /// Classifies a URL, `None` when it is not one of the supported shapes.
    pub fn from_url(url: &str) -> Res<Option<Self>> {
        let kinds = [
            (r"^https://soundcloud\.com/[\w-]+/sets/[\w-]+$", MediaKind::Set),
            (r"^https://soundcloud\.com/you/likes$", MediaKind::Likes),
            (r"^https://soundcloud\.com/[\w-]+/albums$", MediaKind::Albums),
            (r"^https://soundcloud\.com/[\w-]+/tracks$", MediaKind::Tracks),
            (r"^https://soundcloud\.com/[\w-]+/[\w-]+$", MediaKind::Track),
            (
                r"^https://soundcloud\.com/[\w-]+/[\w-]+\?in=[\w-]+/sets/[\w-]+$",
                MediaKind::Track,
            ),
        ];

        for (re, kind) in kinds {
            if utils::pattern(re)?.is_match(url) {
                return Ok(Some(kind));
            }
        }
        Ok(None)
    }
}
