use crate::tags::Tags;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A track present in the file store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub filename: String,
    pub added_at: DateTime<Utc>,
    pub tags: Tags,
}
