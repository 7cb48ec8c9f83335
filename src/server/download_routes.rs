//! Public download route.
//!
//! - GET /download?title&artist&album - Stream the stored file
//!
//! Downloads are readable from any origin.

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower::ServiceExt;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;
use tracing::debug;

use super::response::{run_blocking, ApiError};
use super::state::{GuardedIngestionManager, ServerState};
use super::upload_routes::TrackQuery;

async fn download(
    State(ingestion): State<GuardedIngestionManager>,
    Query(query): Query<TrackQuery>,
    request: Request,
) -> Result<Response, ApiError> {
    let key = query.into_key()?;
    let path = run_blocking(move || ingestion.download_path(&key)).await?;
    debug!("Serving {}", path.display());

    let attachment = path
        .file_name()
        .map(|name| format!("attachment; filename=\"{}\"", name.to_string_lossy()))
        .and_then(|value| HeaderValue::from_str(&value).ok());

    let mut response = match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.map(axum::body::Body::new).into_response(),
        Err(infallible) => match infallible {},
    };
    if let Some(value) = attachment {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

pub fn download_routes() -> Router<ServerState> {
    Router::new()
        .route("/download", get(download))
        .layer(CorsLayer::new().allow_origin(Any))
}
