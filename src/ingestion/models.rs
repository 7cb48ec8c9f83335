use crate::file_store::StoredFile;
use crate::metadata_index::MetadataRecord;
use serde::Serialize;
use std::fmt;

/// Last step an upload reached. A failed upload is reported together with
/// the stage it got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionStage {
    Received,
    Validated,
    QuotaChecked,
    Staged,
    AudioVerified,
    TagsExtracted,
    Placed,
    Indexed,
}

impl IngestionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStage::Received => "RECEIVED",
            IngestionStage::Validated => "VALIDATED",
            IngestionStage::QuotaChecked => "QUOTA_CHECKED",
            IngestionStage::Staged => "STAGED",
            IngestionStage::AudioVerified => "AUDIO_VERIFIED",
            IngestionStage::TagsExtracted => "TAGS_EXTRACTED",
            IngestionStage::Placed => "PLACED",
            IngestionStage::Indexed => "INDEXED",
        }
    }
}

impl fmt::Display for IngestionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A track committed to both stores.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub file: StoredFile,
    pub record: MetadataRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerFileList {
    pub quota: usize,
    pub current: usize,
    pub files: Vec<StoredFile>,
}
