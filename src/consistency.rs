//! Cross-check of the file store against the metadata index.

use crate::file_store::{FileStore, FileStoreError};
use crate::metadata_index::{IndexError, MetadataIndex};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// `(title, artist)` as it appears in a conflict report.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ConflictKey {
    pub title: String,
    pub artist: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictReport {
    pub file_count: usize,
    pub record_count: usize,
    pub files_without_record: Vec<ConflictKey>,
    pub records_without_file: Vec<ConflictKey>,
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} records, {} files without record, {} records without file",
            self.file_count,
            self.record_count,
            self.files_without_record.len(),
            self.records_without_file.len()
        )
    }
}

#[derive(Debug, Error)]
pub enum ConsistencyError {
    #[error("Conflicts found: {0}")]
    ConflictsFound(ConflictReport),

    #[error("File store error: {0}")]
    FileStore(#[from] FileStoreError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}

pub struct ConsistencyChecker {
    store: Arc<FileStore>,
    index: Arc<dyn MetadataIndex>,
}

impl ConsistencyChecker {
    pub fn new(store: Arc<FileStore>, index: Arc<dyn MetadataIndex>) -> Self {
        Self { store, index }
    }

    /// Succeeds when both stores hold the same tracks. Nothing is repaired.
    pub fn check(&self) -> Result<(), ConsistencyError> {
        let files = self.store.enumerate()?;
        let records = self.index.list_all()?;

        let on_disk: BTreeSet<ConflictKey> = files
            .iter()
            .map(|f| ConflictKey {
                title: f.tags.title.clone(),
                artist: f.tags.artist.clone(),
            })
            .collect();
        let indexed: BTreeSet<ConflictKey> = records
            .iter()
            .map(|r| ConflictKey {
                title: r.title.clone(),
                artist: r.artist.clone(),
            })
            .collect();

        let report = ConflictReport {
            file_count: files.len(),
            record_count: records.len(),
            files_without_record: on_disk.difference(&indexed).cloned().collect(),
            records_without_file: indexed.difference(&on_disk).cloned().collect(),
        };

        if report.file_count != report.record_count
            || !report.files_without_record.is_empty()
            || !report.records_without_file.is_empty()
        {
            warn!("Consistency check failed: {}", report);
            return Err(ConsistencyError::ConflictsFound(report));
        }

        info!("Consistency check passed with {} tracks", report.file_count);
        Ok(())
    }
}
