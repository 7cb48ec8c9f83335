//! Warehouse Server Library
//!
//! Tagged audio uploads kept in a file tree and a searchable metadata index.

pub mod audio;
pub mod config;
pub mod consistency;
pub mod file_store;
pub mod ingestion;
pub mod metadata_index;
pub mod server;
pub mod sqlite_persistence;
pub mod tags;

pub use consistency::{ConflictReport, ConsistencyChecker, ConsistencyError};
pub use file_store::FileStore;
pub use ingestion::{IngestionManager, IngestionManagerConfig};
pub use metadata_index::{MetadataIndex, SearchSettings, SqliteMetadataIndex};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
