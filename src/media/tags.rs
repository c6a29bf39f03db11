use std::path::Path;

use lofty::{
    config::WriteOptions,
    picture::{MimeType, Picture, PictureType},
    prelude::*,
    tag::{Tag, TagType},
};

use crate::{Res, utils::Metadata};

/// Writes the metadata mapping into a finished audio file.
pub trait Tagger {
    fn write(&self, meta: &Metadata, path: &Path, extension: &str, cover: Option<&[u8]>)
    -> Res<()>;
}

/// Tag format per container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagWriter {
    Mp4,
    Id3v2,
    VorbisComments,
}

impl TagWriter {
    pub fn for_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "m4a" | "mp4" => Some(TagWriter::Mp4),
            "mp3" => Some(TagWriter::Id3v2),
            "ogg" | "opus" => Some(TagWriter::VorbisComments),
            _ => None,
        }
    }

    fn tag_type(&self) -> TagType {
        match self {
            TagWriter::Mp4 => TagType::Mp4Ilst,
            TagWriter::Id3v2 => TagType::Id3v2,
            TagWriter::VorbisComments => TagType::VorbisComments,
        }
    }

    /// Replaces the file's tag of this format with one built from `meta`.
    pub fn write(&self, meta: &Metadata, path: &Path, cover: Option<&[u8]>) -> Res<()> {
        let mut tag = Tag::new(self.tag_type());

        let fields = [
            (ItemKey::AlbumTitle, &meta.album),
            (ItemKey::AlbumArtist, &meta.albumartist),
            (ItemKey::TrackArtist, &meta.artist),
            (ItemKey::Comment, &meta.comment),
            (ItemKey::Genre, &meta.genre),
            (ItemKey::TrackTitle, &meta.title),
            (ItemKey::RecordingDate, &meta.year),
            (ItemKey::Isrc, &meta.isrc),
            (ItemKey::Barcode, &meta.upc),
            (ItemKey::CopyrightMessage, &meta.copyright),
            (ItemKey::Label, &meta.label),
        ];
        for (key, value) in fields {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                tag.insert_text(key, value.to_string());
            }
        }

        tag.set_track(meta.tracknumber);
        tag.set_track_total(meta.tracktotal);

        if let Some(data) = cover {
            tag.push_picture(Picture::new_unchecked(
                PictureType::CoverFront,
                Some(MimeType::Jpeg),
                None,
                data.to_vec(),
            ));
        }

        tag.save_to_path(path, WriteOptions::default())?;
        Ok(())
    }
}

/// [`Tagger`] that dispatches on the container extension.
///
/// Containers without a known tag format are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerTagger;

impl Tagger for ContainerTagger {
    fn write(
        &self,
        meta: &Metadata,
        path: &Path,
        extension: &str,
        cover: Option<&[u8]>,
    ) -> Res<()> {
        match TagWriter::for_extension(extension) {
            Some(writer) => writer.write(meta, path, cover),
            None => Ok(()),
        }
    }
}
