use anyhow::Result;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use super::download_routes::download_routes;
use super::response::{run_blocking, success, ApiError};
use super::session::Owner;
use super::upload_routes::upload_routes;
use super::{log_requests, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub version: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /health/conflicts
async fn check_conflicts(
    _owner: Owner,
    State(checker): State<GuardedConsistencyChecker>,
) -> Result<Response, ApiError> {
    run_blocking(move || checker.check()).await?;
    Ok(success("No conflicts found", ()))
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        ingestion: GuardedIngestionManager,
        index: GuardedMetadataIndex,
        checker: GuardedConsistencyChecker,
        token_validator: GuardedTokenValidator,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            hash: env!("GIT_HASH").to_owned(),
            ingestion,
            index,
            checker,
            token_validator,
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    ingestion: GuardedIngestionManager,
    index: GuardedMetadataIndex,
    checker: GuardedConsistencyChecker,
    token_validator: GuardedTokenValidator,
) -> Result<Router> {
    let state = ServerState::new(config.clone(), ingestion, index, checker, token_validator);

    let app: Router = Router::new()
        .route("/", get(home))
        .route("/health/conflicts", get(check_conflicts))
        .merge(upload_routes(&config))
        .merge(download_routes())
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state);

    Ok(app)
}

pub async fn run_server(
    config: ServerConfig,
    ingestion: GuardedIngestionManager,
    index: GuardedMetadataIndex,
    checker: GuardedConsistencyChecker,
    token_validator: GuardedTokenValidator,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, ingestion, index, checker, token_validator)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down");
            }
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::ConsistencyChecker;
    use crate::file_store::FileStore;
    use crate::ingestion::{IngestionManager, IngestionManagerConfig};
    use crate::metadata_index::{SearchSettings, SqliteMetadataIndex};
    use crate::server::session::{AllowListTokenValidator, HEADER_ACCESS_TOKEN_KEY};
    use crate::server::RequestsLoggingLevel;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const TOKEN: &str = "test-token";

    fn app(dir: &TempDir) -> Router {
        let store = Arc::new(FileStore::new(dir.path().join("store")));
        let index: GuardedMetadataIndex =
            Arc::new(SqliteMetadataIndex::in_memory(SearchSettings::default()).unwrap());
        let ingestion = Arc::new(IngestionManager::new(
            store.clone(),
            index.clone(),
            IngestionManagerConfig {
                temp_dir: dir.path().join("tmp"),
                ..Default::default()
            },
        ));
        ingestion.init().unwrap();
        let checker = Arc::new(ConsistencyChecker::new(store, index.clone()));
        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            ..Default::default()
        };
        make_app(
            config,
            ingestion,
            index,
            checker,
            Arc::new(AllowListTokenValidator::new([TOKEN])),
        )
        .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(
            format_uptime(Duration::from_secs(86_400 + 3600 + 61)),
            "1d 01:01:01"
        );
    }

    #[tokio::test]
    async fn responds_unauthorized_on_protected_routes() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        let protected_routes = vec![
            ("GET", "/upload?title=a&artist=b"),
            ("DELETE", "/upload?title=a&artist=b&album=c"),
            ("POST", "/upload"),
            ("GET", "/upload/list/last"),
            ("GET", "/upload/list/album"),
            ("GET", "/upload/list/artist"),
            ("GET", "/upload/list/files"),
            ("GET", "/upload/search?q=abcd"),
            ("GET", "/health/conflicts"),
        ];

        for (method, route) in protected_routes {
            let request = Request::builder()
                .method(method)
                .uri(route)
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", route);

            let request = Request::builder()
                .method(method)
                .uri(route)
                .header(HEADER_ACCESS_TOKEN_KEY, "wrong")
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", route);
            let body = body_json(response).await;
            assert_eq!(body["success"], false);
        }
    }

    #[tokio::test]
    async fn home_is_public() {
        let dir = TempDir::new().unwrap();
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app(&dir).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn missing_parameters_are_bad_requests() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);

        for route in ["/upload?title=a", "/upload/search", "/download?title=a&artist=b"] {
            let mut builder = Request::builder().uri(route);
            if route.starts_with("/upload") {
                builder = builder.header(HEADER_ACCESS_TOKEN_KEY, TOKEN);
            }
            let response = app
                .clone()
                .oneshot(builder.body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", route);
            let body = body_json(response).await;
            assert!(body["message"]
                .as_str()
                .unwrap()
                .contains("Missing parameter"));
        }
    }

    #[tokio::test]
    async fn empty_stores_have_no_conflicts() {
        let dir = TempDir::new().unwrap();
        let request = Request::builder()
            .uri("/health/conflicts")
            .header(HEADER_ACCESS_TOKEN_KEY, TOKEN)
            .body(Body::empty())
            .unwrap();
        let response = app(&dir).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], true);
    }
}
