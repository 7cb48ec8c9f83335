//! Staging of uploaded bytes in the temp area.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileHandlerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File too large: {0} bytes (max: {1})")]
    FileTooLarge(u64, u64),
}

/// Writes uploads to anonymous temp files next to the store.
pub struct FileHandler {
    temp_dir: PathBuf,
    max_file_size: u64,
}

impl FileHandler {
    pub fn new(temp_dir: impl Into<PathBuf>, max_file_size: u64) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            max_file_size,
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn init(&self) -> Result<(), FileHandlerError> {
        std::fs::create_dir_all(&self.temp_dir)?;
        Ok(())
    }

    pub fn check_size(&self, size: u64) -> Result<(), FileHandlerError> {
        if size > self.max_file_size {
            return Err(FileHandlerError::FileTooLarge(size, self.max_file_size));
        }
        Ok(())
    }

    /// Write `data` to a fresh temp file. The file is deleted when the
    /// returned handle is dropped unless it is persisted first.
    pub fn stage(&self, data: &[u8]) -> Result<NamedTempFile, FileHandlerError> {
        self.check_size(data.len() as u64)?;
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".part")
            .tempfile_in(&self.temp_dir)?;
        file.write_all(data)?;
        file.flush()?;
        Ok(file)
    }
}
