//! Relational index of track metadata, keyed by `(title, artist)`.

mod models;
mod schema;
mod sqlite_index;

pub use models::{
    group_albums, group_artists, AlbumSummary, ArtistSummary, MetadataRecord, MusicParams,
    SearchField,
};
pub use sqlite_index::{SearchSettings, SqliteMetadataIndex};

use crate::tags::Tags;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Record already exists: {title} by {artist}")]
    AlreadyExists { title: String, artist: String },

    #[error("Record not found: {title} by {artist}")]
    NotFound { title: String, artist: String },

    #[error("Insert of {title} by {artist} did not take effect")]
    WriteFailed { title: String, artist: String },

    #[error("Delete of {title} by {artist} did not take effect")]
    DeleteFailed { title: String, artist: String },

    #[error("Search query must be at least {min} characters")]
    QueryTooShort { min: usize },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait MetadataIndex: Send + Sync {
    fn exists(&self, title: &str, artist: &str) -> Result<bool, IndexError>;

    /// Insert a record for `tags` owned by `owner`, then confirm it is there.
    fn create(
        &self,
        owner: &str,
        params: &MusicParams,
        tags: &Tags,
    ) -> Result<MetadataRecord, IndexError>;

    /// Delete the record, then confirm it is gone.
    fn delete(&self, title: &str, artist: &str) -> Result<MetadataRecord, IndexError>;

    fn get(&self, title: &str, artist: &str) -> Result<MetadataRecord, IndexError>;

    /// Most recently added first.
    fn list_recent(&self, limit: usize) -> Result<Vec<MetadataRecord>, IndexError>;

    /// Every record, in insertion order.
    fn list_all(&self) -> Result<Vec<MetadataRecord>, IndexError>;

    fn count_by_owner(&self, owner: &str) -> Result<usize, IndexError>;

    fn list_albums(&self) -> Result<Vec<AlbumSummary>, IndexError>;

    fn list_artists(&self) -> Result<Vec<ArtistSummary>, IndexError>;

    /// Prefix match on a single field.
    fn search(&self, query: &str, field: SearchField) -> Result<Vec<MetadataRecord>, IndexError>;

    /// Title, artist and album searches merged without duplicates, capped.
    fn search_all(&self, query: &str) -> Result<Vec<MetadataRecord>, IndexError>;
}
