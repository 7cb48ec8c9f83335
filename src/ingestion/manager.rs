//! Ingestion Manager - commits an upload to the file store and the index.
//!
//! Upload workflow:
//! 1. VALIDATED: declared parameters and size are acceptable
//! 2. QUOTA_CHECKED: the owner is below their file limit
//! 3. STAGED: bytes written to a temp file
//! 4. AUDIO_VERIFIED: staged bytes sniff as audio
//! 5. TAGS_EXTRACTED: complete tag set read from the file
//! 6. PLACED: file moved to its canonical path
//! 7. INDEXED: metadata record created
//!
//! A failure before PLACED drops the temp file. A failure at INDEXED removes
//! the placed file again.

use super::file_handler::{FileHandler, FileHandlerError};
use super::models::{IngestionStage, OwnerFileList, UploadOutcome};
use crate::audio;
use crate::file_store::{FileStore, FileStoreError, StoredFile};
use crate::metadata_index::{IndexError, MetadataIndex, MusicParams};
use crate::tags::{extract_tags, TagError, TrackKey};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Invalid upload parameters: {0}")]
    InvalidParams(String),

    #[error("Quota exceeded: {current} of {max} files used")]
    QuotaExceeded { current: usize, max: usize },

    #[error("Uploaded file is not audio")]
    NotAudio,

    #[error("Staging error: {0}")]
    FileHandler(#[from] FileHandlerError),

    #[error("Tag error: {0}")]
    Tags(#[from] TagError),

    #[error("File store error: {0}")]
    FileStore(#[from] FileStoreError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("{title} by {artist} is indexed on album {indexed_album}, not {album}")]
    AlbumMismatch {
        title: String,
        artist: String,
        album: String,
        indexed_album: String,
    },
}

#[derive(Clone)]
pub struct IngestionManagerConfig {
    pub temp_dir: PathBuf,
    /// In bytes.
    pub max_file_size: u64,
    pub max_files_per_owner: usize,
}

impl Default for IngestionManagerConfig {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("data/tmp"),
            max_file_size: 10 * 1024 * 1024,
            max_files_per_owner: 10,
        }
    }
}

pub struct IngestionManager {
    store: Arc<FileStore>,
    index: Arc<dyn MetadataIndex>,
    file_handler: FileHandler,
    config: IngestionManagerConfig,
}

impl IngestionManager {
    pub fn new(
        store: Arc<FileStore>,
        index: Arc<dyn MetadataIndex>,
        config: IngestionManagerConfig,
    ) -> Self {
        let file_handler = FileHandler::new(&config.temp_dir, config.max_file_size);
        Self {
            store,
            index,
            file_handler,
            config,
        }
    }

    /// Create the temp area and the store root.
    pub fn init(&self) -> Result<(), IngestionError> {
        self.file_handler.init()?;
        self.store.init()?;
        Ok(())
    }

    pub fn config(&self) -> &IngestionManagerConfig {
        &self.config
    }

    /// Commit an uploaded track to both stores.
    pub fn upload(
        &self,
        owner: &str,
        params: &MusicParams,
        bytes: &[u8],
    ) -> Result<UploadOutcome, IngestionError> {
        let mut stage = IngestionStage::Received;
        match self.run_upload(owner, params, bytes, &mut stage) {
            Ok(outcome) => {
                info!(
                    "Ingested {} by {} ({})",
                    outcome.record.title, outcome.record.artist, outcome.file.filename
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!("Upload failed after stage {}: {}", stage, e);
                Err(e)
            }
        }
    }

    fn run_upload(
        &self,
        owner: &str,
        params: &MusicParams,
        bytes: &[u8],
        stage: &mut IngestionStage,
    ) -> Result<UploadOutcome, IngestionError> {
        if !params.is_sane() {
            return Err(IngestionError::InvalidParams(
                "image_url must not be empty".to_string(),
            ));
        }
        self.file_handler.check_size(bytes.len() as u64)?;
        *stage = IngestionStage::Validated;

        let current = self.index.count_by_owner(owner)?;
        if current >= self.config.max_files_per_owner {
            return Err(IngestionError::QuotaExceeded {
                current,
                max: self.config.max_files_per_owner,
            });
        }
        *stage = IngestionStage::QuotaChecked;

        // Dropping `staged` on any early return deletes the temp file.
        let staged = self.file_handler.stage(bytes)?;
        *stage = IngestionStage::Staged;
        debug!("Staged {} bytes at {}", bytes.len(), staged.path().display());

        if !audio::is_audio_file(staged.path()) {
            return Err(IngestionError::NotAudio);
        }
        *stage = IngestionStage::AudioVerified;

        let tags = extract_tags(staged.path())?;
        if self.index.exists(&tags.title, &tags.artist)? {
            return Err(IndexError::AlreadyExists {
                title: tags.title,
                artist: tags.artist,
            }
            .into());
        }
        *stage = IngestionStage::TagsExtracted;

        let file = self.store.place(staged, &tags)?;
        *stage = IngestionStage::Placed;

        let record = match self.index.create(owner, params, &tags) {
            Ok(record) => record,
            Err(e) => {
                let key = TrackKey::from(&tags);
                if let Err(undo) = self.store.remove(&key) {
                    error!(
                        "Stores are inconsistent: {} by {} is on disk without a record \
                         (index error: {}, removal error: {})",
                        key.title, key.artist, e, undo
                    );
                } else {
                    info!("Rolled back placement of {} by {}", key.title, key.artist);
                }
                return Err(e.into());
            }
        };
        *stage = IngestionStage::Indexed;

        Ok(UploadOutcome { file, record })
    }

    /// Remove a track from both stores, file first.
    ///
    /// The indexed record must belong to `key.album`; a file at another album
    /// path is never paired with it.
    pub fn delete_track(&self, key: &TrackKey) -> Result<StoredFile, IngestionError> {
        let record = self.index.get(&key.title, &key.artist)?;
        if record.album != key.album {
            warn!(
                "Refusing to delete {} by {} on album {}: indexed on {}",
                key.title, key.artist, key.album, record.album
            );
            return Err(IngestionError::AlbumMismatch {
                title: key.title.clone(),
                artist: key.artist.clone(),
                album: key.album.clone(),
                indexed_album: record.album,
            });
        }

        let removed = self.store.remove(key)?;
        if let Err(e) = self.index.delete(&key.title, &key.artist) {
            error!(
                "Stores are inconsistent: removed {} by {} from disk but not from the index: {}",
                key.title, key.artist, e
            );
            return Err(e.into());
        }
        info!("Deleted {} by {}", key.title, key.artist);
        Ok(removed)
    }

    pub fn list_owner_files(&self, owner: &str) -> Result<OwnerFileList, IngestionError> {
        let current = self.index.count_by_owner(owner)?;
        let mut files = Vec::new();
        for record in self
            .index
            .list_all()?
            .into_iter()
            .filter(|r| r.added_by == owner)
        {
            match self.store.describe(&record.tags()) {
                Ok(file) => files.push(file),
                Err(e) => warn!(
                    "Record {} by {} has no stored file: {}",
                    record.title, record.artist, e
                ),
            }
        }
        Ok(OwnerFileList {
            quota: self.config.max_files_per_owner,
            current,
            files,
        })
    }

    pub fn download_path(&self, key: &TrackKey) -> Result<PathBuf, IngestionError> {
        Ok(self.store.path_for_download(key)?)
    }
}
