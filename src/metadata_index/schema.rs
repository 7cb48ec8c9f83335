//! SQLite schema for the metadata index.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

// =============================================================================
// Version 1 - Music records
// =============================================================================

const MUSIC_TABLE_V1: Table = Table {
    name: "music",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("artist", &SqlType::Text, non_null = true),
        sqlite_column!("album", &SqlType::Text, non_null = true),
        sqlite_column!("published_at", &SqlType::Text, non_null = true),
        sqlite_column!("genre", &SqlType::Text, non_null = true),
        sqlite_column!("image_url", &SqlType::Text, non_null = true),
        sqlite_column!("added_by", &SqlType::Text, non_null = true),
        // Unix millis
        sqlite_column!("added_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[
        ("idx_music_added_by", "added_by"),
        ("idx_music_added_at", "added_at DESC"),
        ("idx_music_album", "album"),
    ],
    unique_constraints: &[&["title", "artist"]],
};

pub const INDEX_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[MUSIC_TABLE_V1],
    migration: None,
}];

/// External-content FTS5 index over the searchable columns, kept in sync by
/// triggers. Created on every open if missing and rebuilt from `music`.
pub const SEARCH_INDEX_SQL: &str = r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS music_fts USING fts5(
        title,
        artist,
        album,
        content='music',
        content_rowid='id'
    );
    CREATE TRIGGER IF NOT EXISTS music_fts_insert AFTER INSERT ON music BEGIN
        INSERT INTO music_fts(rowid, title, artist, album)
        VALUES (new.id, new.title, new.artist, new.album);
    END;
    CREATE TRIGGER IF NOT EXISTS music_fts_delete AFTER DELETE ON music BEGIN
        INSERT INTO music_fts(music_fts, rowid, title, artist, album)
        VALUES ('delete', old.id, old.title, old.artist, old.album);
    END;
    CREATE TRIGGER IF NOT EXISTS music_fts_update AFTER UPDATE ON music BEGIN
        INSERT INTO music_fts(music_fts, rowid, title, artist, album)
        VALUES ('delete', old.id, old.title, old.artist, old.album);
        INSERT INTO music_fts(rowid, title, artist, album)
        VALUES (new.id, new.title, new.artist, new.album);
    END;
    INSERT INTO music_fts(music_fts) VALUES ('rebuild');
"#;
