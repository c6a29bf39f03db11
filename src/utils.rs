use std::collections::HashMap;

use chrono::{DateTime, Datelike};
use regex::Regex;

use crate::{
    Error, Res,
    types::{Playlist, Track, User},
    warning,
};

/// Compiles a regular expression, mapping a bad pattern into [`Error::Config`].
pub fn pattern(re: &str) -> Res<Regex> {
    Regex::new(re).map_err(|e| Error::Config(format!("invalid pattern {re}: {e}")))
}

/// Expands the `-u` arguments into a list of URLs.
///
/// Arguments ending in `.txt` are read as files with one URL per line. URL
/// fragments are dropped and repeated URLs are kept only once, at their
/// first position.
pub async fn process_urls(args: &[String]) -> Res<Vec<String>> {
    let mut processed: Vec<String> = Vec::new();
    let mut push = |url: &str| {
        let url = url.split('#').next().unwrap_or_default().trim().to_string();
        if !url.is_empty() && !processed.contains(&url) {
            processed.push(url);
        }
    };

    for arg in args {
        if arg.ends_with(".txt") {
            let content = async_fs::read_to_string(arg).await?;
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                push(line);
            }
        } else {
            push(arg);
        }
    }

    Ok(processed)
}

/// Tag and template values for one track.
///
/// Album-level fields are filled once per collection; the per-track fields
/// are layered on top with [`Metadata::with_track`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub album: Option<String>,
    pub albumartist: Option<String>,
    pub artist: Option<String>,
    pub comment: Option<String>,
    pub genre: Option<String>,
    pub title: Option<String>,
    pub year: Option<String>,
    pub isrc: Option<String>,
    pub upc: Option<String>,
    pub copyright: Option<String>,
    pub label: Option<String>,
    pub tracknumber: u32,
    pub tracktotal: u32,
}

impl Metadata {
    /// Album-level values of a set.
    pub fn for_playlist(playlist: &Playlist) -> Self {
        Self {
            album: Some(playlist.title.clone()),
            albumartist: Some(playlist.user.username.clone()),
            comment: playlist.permalink_url.clone(),
            genre: playlist.genre.clone(),
            copyright: playlist
                .publisher_metadata
                .as_ref()
                .and_then(|p| p.c_line.clone()),
            tracktotal: playlist.tracks.len() as u32,
            ..Default::default()
        }
    }

    /// Album-level values for a track downloaded on its own; the track title
    /// doubles as the album.
    pub fn for_single(track: &Track, total: u32) -> Self {
        Self {
            album: track.title.clone(),
            albumartist: track.user.as_ref().map(|u| u.username.clone()),
            comment: track.permalink_url.clone(),
            genre: track.genre.clone(),
            copyright: track
                .publisher_metadata
                .as_ref()
                .and_then(|p| p.c_line.clone()),
            tracktotal: total,
            ..Default::default()
        }
    }

    /// Copy of the album-level values with this track's fields filled in.
    pub fn with_track(&self, track: &Track, number: u32) -> Self {
        let publisher = track.publisher_metadata.clone().unwrap_or_default();
        Self {
            artist: publisher
                .artist
                .filter(|a| !a.is_empty())
                .or_else(|| track.user.as_ref().map(|u| u.username.clone())),
            title: track.title.clone(),
            year: track.release_date.as_deref().and_then(release_year),
            isrc: publisher.isrc,
            upc: publisher.upc_or_ean,
            label: track.label_name.clone(),
            tracknumber: number,
            ..self.clone()
        }
    }

    /// Track number zero-padded to the width of the track total.
    pub fn trackpadded(&self) -> String {
        let width = self.tracktotal.to_string().len();
        format!("{:0width$}", self.tracknumber, width = width)
    }

    pub fn values(&self) -> HashMap<&'static str, String> {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        HashMap::from([
            ("album", text(&self.album)),
            ("albumartist", text(&self.albumartist)),
            ("artist", text(&self.artist)),
            ("comment", text(&self.comment)),
            ("genre", text(&self.genre)),
            ("title", text(&self.title)),
            ("year", text(&self.year)),
            ("isrc", text(&self.isrc)),
            ("upc", text(&self.upc)),
            ("copyright", text(&self.copyright)),
            ("label", text(&self.label)),
            ("tracknumber", self.tracknumber.to_string()),
            ("tracktotal", self.tracktotal.to_string()),
            ("trackpadded", self.trackpadded()),
        ])
    }
}

/// Template values describing an artist profile.
pub fn user_values(user: &User) -> HashMap<&'static str, String> {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    HashMap::from([
        ("id", user.id.to_string()),
        ("username", user.username.clone()),
        ("full_name", text(&user.full_name)),
        ("permalink", text(&user.permalink)),
        ("city", text(&user.city)),
        ("country_code", text(&user.country_code)),
    ])
}

fn release_year(date: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(date)
        .map(|d| d.year().to_string())
        .ok()
        .or_else(|| date.split('-').next().filter(|y| !y.is_empty()).map(str::to_string))
}

/// Substitutes `{key}` placeholders.
///
/// # Errors
///
/// [`Error::Template`] naming the first placeholder without a value.
pub fn render_template(template: &str, values: &HashMap<&'static str, String>) -> Res<String> {
    let re = pattern(r"\{(\w+)\}")?;
    if let Some(missing) = re
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .find(|key| !values.contains_key(key.as_str()))
    {
        return Err(Error::Template(missing));
    }

    Ok(re
        .replace_all(template, |caps: &regex::Captures| {
            values.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned())
}

/// Renders `template`, falling back to `default` on an unknown key, and
/// sanitizes the result for use as a single path component.
pub fn parse_template(
    values: &HashMap<&'static str, String>,
    template: &str,
    default: &str,
) -> String {
    let rendered = match render_template(template, values) {
        Ok(rendered) => rendered,
        Err(e) => {
            warning!(
                "Failed to parse template ({}). Default one will be used instead.",
                e
            );
            render_template(default, values).unwrap_or_else(|_| default.to_string())
        }
    };
    sanitize(&rendered)
}

/// Replaces characters that cannot appear in a file name on this platform.
pub fn sanitize(name: &str) -> String {
    if cfg!(windows) {
        name.chars()
            .map(|c| match c {
                '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                other => other,
            })
            .collect()
    } else {
        name.replace('/', "_")
    }
}
