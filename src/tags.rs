//! Embedded tag extraction for staged audio files.
//!
//! Every track placed in the store must carry a complete tag set: the
//! title/artist/album triple addresses the file on disk and, together with
//! genre and year, feeds the metadata index.

use id3::{Tag, TagLike};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TagError {
    #[error("Missing tag field: {0}")]
    MissingField(&'static str),

    #[error("Unreadable tag in {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// The five-field tag set of a stored track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tags {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub published_at: String,
    pub genre: String,
}

impl Tags {
    /// Build a tag set, rejecting it if any field is empty after trimming.
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        published_at: impl Into<String>,
        genre: impl Into<String>,
    ) -> Result<Self, TagError> {
        Ok(Self {
            title: required("title", Some(title.into()))?,
            artist: required("artist", Some(artist.into()))?,
            album: required("album", Some(album.into()))?,
            published_at: required("year", Some(published_at.into()))?,
            genre: required("genre", Some(genre.into()))?,
        })
    }
}

/// Address of a track as supplied by a caller: enough to locate the file,
/// not enough to describe it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackKey {
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl From<&Tags> for TrackKey {
    fn from(tags: &Tags) -> Self {
        Self {
            title: tags.title.clone(),
            artist: tags.artist.clone(),
            album: tags.album.clone(),
        }
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, TagError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(TagError::MissingField(field)),
    }
}

/// Read the ID3 tag of `path` and return the complete tag set.
///
/// A file with no tag at all is reported as missing its title, since that is
/// the first field the store needs.
pub fn extract_tags(path: &Path) -> Result<Tags, TagError> {
    let tag = match Tag::read_from_path(path) {
        Ok(tag) => tag,
        Err(id3::Error {
            kind: id3::ErrorKind::NoTag,
            ..
        }) => {
            debug!("No ID3 tag found in {}", path.display());
            return Err(TagError::MissingField("title"));
        }
        Err(e) => {
            return Err(TagError::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        }
    };

    let year = tag
        .year()
        .or_else(|| tag.date_recorded().map(|ts| ts.year))
        .map(|y| y.to_string());

    Ok(Tags {
        title: required("title", tag.title().map(String::from))?,
        artist: required("artist", tag.artist().map(String::from))?,
        album: required("album", tag.album().map(String::from))?,
        genre: required("genre", tag.genre_parsed().map(|g| g.to_string()))?,
        published_at: required("year", year)?,
    })
}
