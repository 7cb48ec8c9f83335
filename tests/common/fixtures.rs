//! Audio payloads for end-to-end tests.

#![allow(dead_code)]

use super::constants::{GENRE, YEAR};
use id3::{Tag, TagLike, Version};

/// A bare MPEG frame header, enough for content sniffing to call it audio.
const MPEG_FRAME: &[u8] = &[0xFF, 0xFB, 0x90, 0x64, 0x00, 0x00, 0x00, 0x00];

/// Build an MP3 payload with an ID3v2.3 tag. `None` fields are left out.
pub fn mp3_bytes(
    title: Option<&str>,
    artist: Option<&str>,
    album: Option<&str>,
    year: Option<i32>,
    genre: Option<&str>,
) -> Vec<u8> {
    let mut tag = Tag::new();
    if let Some(v) = title {
        tag.set_title(v);
    }
    if let Some(v) = artist {
        tag.set_artist(v);
    }
    if let Some(v) = album {
        tag.set_album(v);
    }
    if let Some(v) = year {
        tag.set_year(v);
    }
    if let Some(v) = genre {
        tag.set_genre(v);
    }

    let mut out = Vec::new();
    tag.write_to(&mut out, Version::Id3v23)
        .expect("Failed to encode ID3 tag");
    out.extend_from_slice(MPEG_FRAME);
    out.extend(std::iter::repeat(0u8).take(512));
    out
}

/// A fully tagged track.
pub fn mp3_with_tags(title: &str, artist: &str, album: &str) -> Vec<u8> {
    mp3_bytes(Some(title), Some(artist), Some(album), Some(YEAR), Some(GENRE))
}

pub fn not_audio_bytes() -> Vec<u8> {
    b"definitely a plain text file and not a song".to_vec()
}
