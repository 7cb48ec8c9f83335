//! JSON envelope shared by every route and the single error-to-status map.

use crate::consistency::ConsistencyError;
use crate::file_store::FileStoreError;
use crate::ingestion::{FileHandlerError, IngestionError};
use crate::metadata_index::IndexError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

pub fn success<T: Serialize>(message: impl Into<String>, data: T) -> Response {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            message: message.into(),
            data: Some(data),
        }),
    )
        .into_response()
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn missing_parameter(name: &str) -> Self {
        Self::bad_request(format!("Missing parameter: {}", name))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiResponse {
                success: false,
                message: self.message,
                data: self.data,
            }),
        )
            .into_response()
    }
}

impl From<IndexError> for ApiError {
    fn from(e: IndexError) -> Self {
        let status = match &e {
            IndexError::AlreadyExists { .. } | IndexError::QueryTooShort { .. } => {
                StatusCode::BAD_REQUEST
            }
            IndexError::NotFound { .. } => StatusCode::NOT_FOUND,
            IndexError::WriteFailed { .. }
            | IndexError::DeleteFailed { .. }
            | IndexError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl From<FileStoreError> for ApiError {
    fn from(e: FileStoreError) -> Self {
        let status = match &e {
            FileStoreError::AlreadyExists(_) | FileStoreError::NameTooLong(_) => {
                StatusCode::BAD_REQUEST
            }
            FileStoreError::NotFound(_) => StatusCode::NOT_FOUND,
            FileStoreError::NotADirectory(_) | FileStoreError::Io(_) | FileStoreError::Tags(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, e.to_string())
    }
}

impl From<IngestionError> for ApiError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::FileStore(e) => e.into(),
            IngestionError::Index(e) => e.into(),
            e @ IngestionError::AlbumMismatch { .. } => {
                Self::new(StatusCode::NOT_FOUND, e.to_string())
            }
            IngestionError::FileHandler(FileHandlerError::Io(io)) => {
                error!("Staging failed: {}", io);
                Self::internal("Failed to stage upload")
            }
            e @ (IngestionError::InvalidParams(_)
            | IngestionError::QuotaExceeded { .. }
            | IngestionError::NotAudio
            | IngestionError::FileHandler(FileHandlerError::FileTooLarge(_, _))
            | IngestionError::Tags(_)) => Self::bad_request(e.to_string()),
        }
    }
}

impl From<ConsistencyError> for ApiError {
    fn from(e: ConsistencyError) -> Self {
        match e {
            ConsistencyError::ConflictsFound(report) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: format!("Conflicts found: {}", report),
                data: serde_json::to_value(&report).ok(),
            },
            ConsistencyError::FileStore(e) => e.into(),
            ConsistencyError::Index(e) => e.into(),
        }
    }
}

/// Run blocking store work off the async runtime.
pub async fn run_blocking<T, E, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(Into::into),
        Err(e) => {
            error!("Blocking task failed: {}", e);
            Err(ApiError::internal("Internal server error"))
        }
    }
}
