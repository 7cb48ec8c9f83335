//! Upload ingestion: staging, validation and the paired write to the file
//! store and the metadata index.

mod file_handler;
mod manager;
mod models;

pub use file_handler::{FileHandler, FileHandlerError};
pub use manager::{IngestionError, IngestionManager, IngestionManagerConfig};
pub use models::{IngestionStage, OwnerFileList, UploadOutcome};
