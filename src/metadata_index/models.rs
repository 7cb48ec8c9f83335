use crate::tags::{Tags, TrackKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters declared by the uploader alongside the audio bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicParams {
    pub image_url: String,
}

impl MusicParams {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
        }
    }

    pub fn is_sane(&self) -> bool {
        !self.image_url.trim().is_empty()
    }
}

/// One indexed track. `(title, artist)` is unique across the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataRecord {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub published_at: String,
    pub genre: String,
    pub image_url: String,
    pub added_at: DateTime<Utc>,
    /// Owner token; never rendered.
    #[serde(skip_serializing)]
    pub added_by: String,
}

impl MetadataRecord {
    pub fn key(&self) -> TrackKey {
        TrackKey {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
        }
    }

    pub fn tags(&self) -> Tags {
        Tags {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            published_at: self.published_at.clone(),
            genre: self.genre.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumSummary {
    pub name: String,
    pub titles: Vec<String>,
    pub artist: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistSummary {
    pub name: String,
    pub albums: Vec<AlbumSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Artist,
    Album,
}

impl SearchField {
    /// Order in which a search over every field visits them.
    pub const ALL: [SearchField; 3] = [SearchField::Title, SearchField::Artist, SearchField::Album];

    pub fn column(&self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Artist => "artist",
            SearchField::Album => "album",
        }
    }
}

/// Group records by album name, in order of first appearance.
///
/// Artist and image URL of an album come from the last record seen for it.
pub fn group_albums(records: &[MetadataRecord]) -> Vec<AlbumSummary> {
    let mut albums: Vec<AlbumSummary> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match positions.get(record.album.as_str()) {
            Some(&i) => {
                let album = &mut albums[i];
                album.titles.push(record.title.clone());
                album.artist = record.artist.clone();
                album.image_url = record.image_url.clone();
            }
            None => {
                positions.insert(&record.album, albums.len());
                albums.push(AlbumSummary {
                    name: record.album.clone(),
                    titles: vec![record.title.clone()],
                    artist: record.artist.clone(),
                    image_url: record.image_url.clone(),
                });
            }
        }
    }
    albums
}

/// Every indexed artist, in order of first appearance, with the albums
/// attributed to them. An artist whose albums are all attributed to someone
/// else is still listed, with no albums.
pub fn group_artists(records: &[MetadataRecord], albums: Vec<AlbumSummary>) -> Vec<ArtistSummary> {
    let mut artists: Vec<ArtistSummary> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    let names = records
        .iter()
        .map(|r| r.artist.clone())
        .chain(albums.iter().map(|a| a.artist.clone()));
    for name in names {
        if !positions.contains_key(&name) {
            positions.insert(name.clone(), artists.len());
            artists.push(ArtistSummary {
                name,
                albums: Vec::new(),
            });
        }
    }

    for album in albums {
        if let Some(&i) = positions.get(&album.artist) {
            artists[i].albums.push(album);
        }
    }
    artists
}
