use super::models::StoredFile;
use crate::tags::{extract_tags, TagError, Tags, TrackKey};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub const AUDIO_EXTENSION: &str = "mp3";

/// artist / album / title
const TREE_DEPTH: usize = 3;

/// NAME_MAX on the filesystems we run on.
pub const MAX_SEGMENT_BYTES: usize = 255;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Path segment is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Stored file has unreadable tags: {0}")]
    Tags(#[from] TagError),

    #[error("Name does not fit in a path segment: {0}")]
    NameTooLong(String),
}

/// Escape a tag value so it maps to exactly one path segment.
///
/// `%` is escaped too, which keeps the mapping injective.
pub fn escape_segment(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        match c {
            '%' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => {
                out.push_str(&format!("%{:02X}", c as u32))
            }
            '.' if i == 0 => out.push_str("%2E"),
            _ => out.push(c),
        }
    }
    out
}

/// The first tag value whose escaped segment would exceed `MAX_SEGMENT_BYTES`.
fn overlong_segment(key: &TrackKey) -> Option<&str> {
    let title_len = escape_segment(&key.title).len() + AUDIO_EXTENSION.len() + 1;
    if escape_segment(&key.artist).len() > MAX_SEGMENT_BYTES {
        Some(&key.artist)
    } else if escape_segment(&key.album).len() > MAX_SEGMENT_BYTES {
        Some(&key.album)
    } else if title_len > MAX_SEGMENT_BYTES {
        Some(&key.title)
    } else {
        None
    }
}

fn modified_at(meta: &fs::Metadata) -> DateTime<Utc> {
    meta.modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Create `path` as a directory unless it already is one.
///
/// Losing a creation race to another request is fine; finding a plain file
/// in the way is not.
fn ensure_dir(path: &Path) -> Result<(), FileStoreError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(FileStoreError::NotADirectory(path.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => match fs::create_dir(path) {
            Ok(()) => {
                debug!("Created store directory {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(FileStoreError::NotADirectory(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        },
        Err(e) => Err(e.into()),
    }
}

/// Owns the artist/album/title tree under a base directory.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Create the base directory if needed.
    pub fn init(&self) -> Result<(), FileStoreError> {
        fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }

    fn artist_dir(&self, key: &TrackKey) -> PathBuf {
        self.base_dir.join(escape_segment(&key.artist))
    }

    fn album_dir(&self, key: &TrackKey) -> PathBuf {
        self.artist_dir(key).join(escape_segment(&key.album))
    }

    /// The single location a track with this key may occupy.
    pub fn canonical_path(&self, key: &TrackKey) -> PathBuf {
        self.album_dir(key)
            .join(format!("{}.{}", escape_segment(&key.title), AUDIO_EXTENSION))
    }

    /// Move a staged upload to its canonical location.
    ///
    /// The staged file is consumed either way: on success it becomes the
    /// stored file, on failure it is dropped and deleted from the temp area.
    pub fn place(&self, staged: NamedTempFile, tags: &Tags) -> Result<StoredFile, FileStoreError> {
        let key = TrackKey::from(tags);
        if let Some(name) = overlong_segment(&key) {
            return Err(FileStoreError::NameTooLong(name.to_string()));
        }
        let dest = self.canonical_path(&key);

        let mut staged = staged;
        let mut attempts = 0;
        loop {
            attempts += 1;
            ensure_dir(&self.artist_dir(&key))?;
            ensure_dir(&self.album_dir(&key))?;

            if dest.symlink_metadata().is_ok() {
                return Err(FileStoreError::AlreadyExists(dest));
            }

            // No-clobber persist: a concurrent placement of the same key
            // fails here instead of overwriting.
            match staged.persist_noclobber(&dest) {
                Ok(_) => break,
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    return Err(FileStoreError::AlreadyExists(dest));
                }
                // The album directory was pruned by a concurrent removal.
                Err(e) if e.error.kind() == ErrorKind::NotFound && attempts < 2 => {
                    staged = e.file;
                }
                Err(e) => return Err(e.error.into()),
            }
        }

        let meta = fs::metadata(&dest)?;
        info!("Placed {}", dest.display());
        Ok(StoredFile {
            filename: file_name_of(&dest),
            added_at: modified_at(&meta),
            tags: tags.clone(),
        })
    }

    /// Delete the file at the key's canonical path, pruning directories it
    /// leaves empty.
    pub fn remove(&self, key: &TrackKey) -> Result<StoredFile, FileStoreError> {
        let path = self.canonical_path(key);
        if overlong_segment(key).is_some() {
            return Err(FileStoreError::NotFound(path));
        }
        let meta = match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(FileStoreError::NotFound(path)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FileStoreError::NotFound(path))
            }
            Err(e) => return Err(e.into()),
        };

        let tags = extract_tags(&path)?;
        fs::remove_file(&path)?;
        info!("Removed {}", path.display());

        for dir in [self.album_dir(key), self.artist_dir(key)] {
            if let Err(e) = fs::remove_dir(&dir) {
                debug!("Keeping {}: {}", dir.display(), e);
                break;
            }
        }

        Ok(StoredFile {
            filename: file_name_of(&path),
            added_at: modified_at(&meta),
            tags,
        })
    }

    /// Every stored file, in lexicographic path order.
    ///
    /// Files whose tags cannot be read are skipped.
    pub fn enumerate(&self) -> Result<Vec<StoredFile>, FileStoreError> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.base_dir)
            .min_depth(TREE_DEPTH)
            .max_depth(TREE_DEPTH)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable store entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let tags = match extract_tags(path) {
                Ok(tags) => tags,
                Err(e) => {
                    warn!("Error reading tags of {}: {}", path.display(), e);
                    continue;
                }
            };
            let added_at = match entry.metadata() {
                Ok(meta) => modified_at(&meta),
                Err(e) => {
                    warn!("Error reading metadata of {}: {}", path.display(), e);
                    continue;
                }
            };

            files.push(StoredFile {
                filename: file_name_of(path),
                added_at,
                tags,
            });
        }

        Ok(files)
    }

    /// Describe the stored file for a known tag set without re-reading tags.
    pub fn describe(&self, tags: &Tags) -> Result<StoredFile, FileStoreError> {
        let key = TrackKey::from(tags);
        let path = self.canonical_path(&key);
        if overlong_segment(&key).is_some() {
            return Err(FileStoreError::NotFound(path));
        }
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(StoredFile {
                filename: file_name_of(&path),
                added_at: modified_at(&meta),
                tags: tags.clone(),
            }),
            Ok(_) => Err(FileStoreError::NotFound(path)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FileStoreError::NotFound(path)),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve the on-disk path of a stored track without touching its bytes.
    pub fn path_for_download(&self, key: &TrackKey) -> Result<PathBuf, FileStoreError> {
        let path = self.canonical_path(key);
        if overlong_segment(key).is_none() && path.is_file() {
            Ok(path)
        } else {
            Err(FileStoreError::NotFound(path))
        }
    }
}
