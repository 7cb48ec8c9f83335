//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own store, temp area and index.

use super::constants::*;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use warehouse_server::ingestion::IngestionManagerConfig;
use warehouse_server::server::{make_app, AllowListTokenValidator, RequestsLoggingLevel, ServerConfig};
use warehouse_server::{
    ConsistencyChecker, FileStore, IngestionManager, MetadataIndex, SearchSettings,
    SqliteMetadataIndex,
};

/// Test server instance with isolated storage
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    pub port: u16,

    /// Direct access to the file tree, for arranging inconsistencies
    pub store: Arc<FileStore>,

    /// Direct access to the index, for arranging inconsistencies
    pub index: Arc<dyn MetadataIndex>,

    _data_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if storage cannot be created, the port cannot be bound or the
    /// server does not become ready within the timeout.
    pub async fn spawn() -> Self {
        let data_dir = TempDir::new().expect("Failed to create data dir");

        let index: Arc<dyn MetadataIndex> = Arc::new(
            SqliteMetadataIndex::new(data_dir.path().join("warehouse.db"), SearchSettings::default())
                .expect("Failed to open metadata index"),
        );
        let store = Arc::new(FileStore::new(data_dir.path().join("store")));

        let ingestion = Arc::new(IngestionManager::new(
            store.clone(),
            index.clone(),
            IngestionManagerConfig {
                temp_dir: data_dir.path().join("tmp"),
                max_file_size: TEST_MAX_FILE_SIZE_BYTES,
                max_files_per_owner: TEST_MAX_FILES_PER_OWNER,
            },
        ));
        ingestion.init().expect("Failed to init ingestion");

        let checker = Arc::new(ConsistencyChecker::new(store.clone(), index.clone()));
        let token_validator = Arc::new(AllowListTokenValidator::new([OWNER_1_TOKEN, OWNER_2_TOKEN]));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            recent_list_limit: TEST_RECENT_LIST_LIMIT,
            max_upload_body_size: (TEST_MAX_FILE_SIZE_BYTES * 4) as usize,
        };

        let app = make_app(config, ingestion, index.clone(), checker, token_validator)
            .expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            store,
            index,
            _data_dir: data_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Polls `/` until the server answers
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!("Server did not become ready within {:?}", timeout);
            }
            if let Ok(response) = client.get(format!("{}/", self.base_url)).send().await {
                if response.status().is_success() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
