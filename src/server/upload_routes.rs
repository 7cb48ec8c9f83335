//! Upload HTTP routes.
//!
//! All routes require an access token:
//! - POST /upload - Upload a tagged audio file (multipart: `file`, `image_url`)
//! - GET /upload - Get the record of a track
//! - DELETE /upload - Delete a track from both stores
//! - GET /upload/list/{last,album,artist,files} - Listings
//! - GET /upload/search - Search title, artist and album

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{debug, warn};

use super::response::{run_blocking, success, ApiError};
use super::session::Owner;
use super::state::{GuardedIngestionManager, GuardedMetadataIndex, ServerState};
use super::ServerConfig;
use crate::metadata_index::MusicParams;
use crate::tags::TrackKey;

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

fn required(name: &str, value: Option<String>) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::missing_parameter(name)),
    }
}

impl TrackQuery {
    pub fn into_key(self) -> Result<TrackKey, ApiError> {
        Ok(TrackKey {
            title: required("title", self.title)?,
            artist: required("artist", self.artist)?,
            album: required("album", self.album)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// POST /upload
async fn upload(
    owner: Owner,
    State(ingestion): State<GuardedIngestionManager>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut data: Option<Vec<u8>> = None;
    let mut image_url = String::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read multipart body: {}", e);
                return Err(ApiError::bad_request("Malformed multipart body"));
            }
        };
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => match field.bytes().await {
                Ok(bytes) => data = Some(bytes.to_vec()),
                Err(e) => {
                    warn!("Failed to read file data: {}", e);
                    return Err(ApiError::bad_request("Failed to read file"));
                }
            },
            "image_url" => match field.text().await {
                Ok(text) => image_url = text,
                Err(e) => {
                    warn!("Failed to read image_url: {}", e);
                    return Err(ApiError::bad_request("Failed to read image_url"));
                }
            },
            _ => {}
        }
    }

    let data = match data {
        Some(d) if !d.is_empty() => d,
        _ => return Err(ApiError::missing_parameter("file")),
    };
    debug!("Received upload of {} bytes", data.len());

    let params = MusicParams::new(image_url);
    let outcome =
        run_blocking(move || ingestion.upload(&owner.token, &params, &data)).await?;
    Ok(success("Upload successful", outcome))
}

/// GET /upload?title&artist
async fn get_track(
    _owner: Owner,
    State(index): State<GuardedMetadataIndex>,
    Query(query): Query<TrackQuery>,
) -> Result<Response, ApiError> {
    let title = required("title", query.title)?;
    let artist = required("artist", query.artist)?;
    let record = run_blocking(move || index.get(&title, &artist)).await?;
    Ok(success("Track found", record))
}

/// DELETE /upload?title&artist&album
async fn delete_track(
    _owner: Owner,
    State(ingestion): State<GuardedIngestionManager>,
    Query(query): Query<TrackQuery>,
) -> Result<Response, ApiError> {
    let key = query.into_key()?;
    let removed = run_blocking(move || ingestion.delete_track(&key)).await?;
    Ok(success("Track deleted", removed))
}

/// GET /upload/list/last
async fn list_last(
    _owner: Owner,
    State(config): State<ServerConfig>,
    State(index): State<GuardedMetadataIndex>,
) -> Result<Response, ApiError> {
    let limit = config.recent_list_limit;
    let records = run_blocking(move || index.list_recent(limit)).await?;
    Ok(success("Recent tracks", records))
}

/// GET /upload/list/album
async fn list_albums(
    _owner: Owner,
    State(index): State<GuardedMetadataIndex>,
) -> Result<Response, ApiError> {
    let albums = run_blocking(move || index.list_albums()).await?;
    Ok(success("Albums", albums))
}

/// GET /upload/list/artist
async fn list_artists(
    _owner: Owner,
    State(index): State<GuardedMetadataIndex>,
) -> Result<Response, ApiError> {
    let artists = run_blocking(move || index.list_artists()).await?;
    Ok(success("Artists", artists))
}

/// GET /upload/list/files
async fn list_owner_files(
    owner: Owner,
    State(ingestion): State<GuardedIngestionManager>,
) -> Result<Response, ApiError> {
    let listing = run_blocking(move || ingestion.list_owner_files(&owner.token)).await?;
    Ok(success("Owner files", listing))
}

/// GET /upload/search?q=
async fn search(
    _owner: Owner,
    State(index): State<GuardedMetadataIndex>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let q = query.q.ok_or_else(|| ApiError::missing_parameter("q"))?;
    let records = run_blocking(move || index.search_all(&q)).await?;
    Ok(success("Search results", records))
}

pub fn upload_routes(config: &ServerConfig) -> Router<ServerState> {
    Router::new()
        .route(
            "/upload",
            get(get_track).post(upload).delete(delete_track),
        )
        .route("/upload/list/last", get(list_last))
        .route("/upload/list/album", get(list_albums))
        .route("/upload/list/artist", get(list_artists))
        .route("/upload/list/files", get(list_owner_files))
        .route("/upload/search", get(search))
        .layer(DefaultBodyLimit::max(config.max_upload_body_size))
}
