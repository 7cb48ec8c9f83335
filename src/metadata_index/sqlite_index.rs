use super::models::{
    group_albums, group_artists, AlbumSummary, ArtistSummary, MetadataRecord, MusicParams,
    SearchField,
};
use super::schema::{INDEX_VERSIONED_SCHEMAS, SEARCH_INDEX_SQL};
use super::{IndexError, MetadataIndex};
use crate::sqlite_persistence::{open_versioned, prepare_schema};
use crate::tags::Tags;
use anyhow::Context;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info};

const SELECT_RECORD: &str = "SELECT music.title, music.artist, music.album, music.published_at, \
     music.genre, music.image_url, music.added_by, music.added_at FROM music";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// In characters, after trimming.
    pub min_query_length: usize,
    pub result_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_query_length: 4,
            result_limit: 10,
        }
    }
}

pub struct SqliteMetadataIndex {
    conn: Arc<Mutex<Connection>>,
    settings: SearchSettings,
}

impl SqliteMetadataIndex {
    pub fn new<P: AsRef<Path>>(db_path: P, settings: SearchSettings) -> anyhow::Result<Self> {
        let conn = open_versioned(db_path, INDEX_VERSIONED_SCHEMAS, "metadata index")?;
        Self::from_connection(conn, settings)
    }

    pub fn in_memory(settings: SearchSettings) -> anyhow::Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        prepare_schema(&mut conn, INDEX_VERSIONED_SCHEMAS, "metadata index")?;
        Self::from_connection(conn, settings)
    }

    fn from_connection(conn: Connection, settings: SearchSettings) -> anyhow::Result<Self> {
        conn.execute_batch(SEARCH_INDEX_SQL)
            .context("Failed to prepare search index")?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM music", [], |row| row.get(0))?;
        info!("Metadata index ready with {} records", count);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            settings,
        })
    }

    pub fn settings(&self) -> SearchSettings {
        self.settings
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn row_to_record(row: &Row) -> rusqlite::Result<MetadataRecord> {
        let added_at_millis: i64 = row.get(7)?;
        Ok(MetadataRecord {
            title: row.get(0)?,
            artist: row.get(1)?,
            album: row.get(2)?,
            published_at: row.get(3)?,
            genre: row.get(4)?,
            image_url: row.get(5)?,
            added_by: row.get(6)?,
            added_at: DateTime::from_timestamp_millis(added_at_millis).unwrap_or_default(),
        })
    }

    fn get_locked(
        conn: &Connection,
        title: &str,
        artist: &str,
    ) -> Result<Option<MetadataRecord>, IndexError> {
        let record = conn
            .query_row(
                &format!("{} WHERE music.title = ?1 AND music.artist = ?2", SELECT_RECORD),
                params![title, artist],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn query_records(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<MetadataRecord>, IndexError> {
        let mut stmt = conn.prepare(sql)?;
        let records = stmt
            .query_map(params, Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn check_query(&self, query: &str) -> Result<(), IndexError> {
        if query.chars().count() < self.settings.min_query_length {
            return Err(IndexError::QueryTooShort {
                min: self.settings.min_query_length,
            });
        }
        Ok(())
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation)
}

/// `column : "query" *` with embedded quotes doubled.
fn prefix_match_expression(field: SearchField, query: &str) -> String {
    format!("{} : \"{}\" *", field.column(), query.replace('"', "\"\""))
}

impl MetadataIndex for SqliteMetadataIndex {
    fn exists(&self, title: &str, artist: &str) -> Result<bool, IndexError> {
        let conn = self.lock();
        Ok(Self::get_locked(&conn, title, artist)?.is_some())
    }

    fn create(
        &self,
        owner: &str,
        music_params: &MusicParams,
        tags: &Tags,
    ) -> Result<MetadataRecord, IndexError> {
        let already_exists = || IndexError::AlreadyExists {
            title: tags.title.clone(),
            artist: tags.artist.clone(),
        };

        let conn = self.lock();
        if Self::get_locked(&conn, &tags.title, &tags.artist)?.is_some() {
            return Err(already_exists());
        }

        let inserted = conn.execute(
            "INSERT INTO music (title, artist, album, published_at, genre, image_url, added_by, added_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                tags.title,
                tags.artist,
                tags.album,
                tags.published_at,
                tags.genre,
                music_params.image_url,
                owner,
                Utc::now().timestamp_millis(),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(already_exists()),
            Err(e) => return Err(e.into()),
        }

        match Self::get_locked(&conn, &tags.title, &tags.artist)? {
            Some(record) => {
                debug!("Indexed {} by {}", record.title, record.artist);
                Ok(record)
            }
            None => {
                error!(
                    "Insert of {} by {} reported success but no record is present",
                    tags.title, tags.artist
                );
                Err(IndexError::WriteFailed {
                    title: tags.title.clone(),
                    artist: tags.artist.clone(),
                })
            }
        }
    }

    fn delete(&self, title: &str, artist: &str) -> Result<MetadataRecord, IndexError> {
        let conn = self.lock();
        let record = Self::get_locked(&conn, title, artist)?.ok_or_else(|| {
            IndexError::NotFound {
                title: title.to_string(),
                artist: artist.to_string(),
            }
        })?;

        conn.execute(
            "DELETE FROM music WHERE title = ?1 AND artist = ?2",
            params![title, artist],
        )?;

        if Self::get_locked(&conn, title, artist)?.is_some() {
            error!(
                "Delete of {} by {} reported success but the record is still present",
                title, artist
            );
            return Err(IndexError::DeleteFailed {
                title: title.to_string(),
                artist: artist.to_string(),
            });
        }
        Ok(record)
    }

    fn get(&self, title: &str, artist: &str) -> Result<MetadataRecord, IndexError> {
        let conn = self.lock();
        Self::get_locked(&conn, title, artist)?.ok_or_else(|| IndexError::NotFound {
            title: title.to_string(),
            artist: artist.to_string(),
        })
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<MetadataRecord>, IndexError> {
        let conn = self.lock();
        Self::query_records(
            &conn,
            &format!(
                "{} ORDER BY music.added_at DESC, music.id DESC LIMIT ?1",
                SELECT_RECORD
            ),
            params![limit as i64],
        )
    }

    fn list_all(&self) -> Result<Vec<MetadataRecord>, IndexError> {
        let conn = self.lock();
        Self::query_records(&conn, &format!("{} ORDER BY music.id", SELECT_RECORD), [])
    }

    fn count_by_owner(&self, owner: &str) -> Result<usize, IndexError> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM music WHERE added_by = ?1",
            params![owner],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn list_albums(&self) -> Result<Vec<AlbumSummary>, IndexError> {
        Ok(group_albums(&self.list_all()?))
    }

    fn list_artists(&self) -> Result<Vec<ArtistSummary>, IndexError> {
        let records = self.list_all()?;
        Ok(group_artists(&records, group_albums(&records)))
    }

    fn search(&self, query: &str, field: SearchField) -> Result<Vec<MetadataRecord>, IndexError> {
        let query = query.trim();
        self.check_query(query)?;
        // Nothing the tokenizer would keep.
        if !query.chars().any(char::is_alphanumeric) {
            return Ok(Vec::new());
        }

        let conn = self.lock();
        Self::query_records(
            &conn,
            &format!(
                "{} JOIN music_fts ON music_fts.rowid = music.id \
                 WHERE music_fts MATCH ?1 ORDER BY music.id LIMIT ?2",
                SELECT_RECORD
            ),
            params![
                prefix_match_expression(field, query),
                self.settings.result_limit as i64
            ],
        )
    }

    fn search_all(&self, query: &str) -> Result<Vec<MetadataRecord>, IndexError> {
        let limit = self.settings.result_limit;
        let mut results: Vec<MetadataRecord> = Vec::new();

        'fields: for field in SearchField::ALL {
            let matches = self.search(query, field)?;
            for record in matches {
                if results.len() >= limit {
                    break 'fields;
                }
                if !results.contains(&record) {
                    results.push(record);
                }
            }
            if results.len() >= limit {
                break;
            }
        }
        Ok(results)
    }
}
