//! On-disk track hierarchy: `base/artist/album/title.mp3`.

mod models;
mod store;

pub use models::StoredFile;
pub use store::{escape_segment, FileStore, FileStoreError, AUDIO_EXTENSION};
