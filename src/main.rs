use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use warehouse_server::config::{AppConfig, CliConfig, FileConfig};
use warehouse_server::server::{AllowListTokenValidator, ServerConfig};
use warehouse_server::{
    run_server, ConsistencyChecker, FileStore, IngestionManager, MetadataIndex,
    RequestsLoggingLevel, SqliteMetadataIndex,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding the store, the temp area and the index database.
    #[clap(long, value_parser = parse_path)]
    pub data_dir: Option<PathBuf>,

    /// Root of the artist/album/title file tree. Defaults to <data-dir>/store.
    #[clap(long, value_parser = parse_path)]
    pub store_dir: Option<PathBuf>,

    /// Staging area for uploads, same filesystem as the store. Defaults to <data-dir>/tmp.
    #[clap(long, value_parser = parse_path)]
    pub temp_dir: Option<PathBuf>,

    /// SQLite metadata index. Defaults to <data-dir>/warehouse.db.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3002)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Accepted access token. Repeat for more owners.
    #[clap(long = "access-token")]
    pub access_tokens: Vec<String>,

    #[clap(long, default_value_t = 10)]
    pub max_file_size_mb: u64,

    #[clap(long, default_value_t = 10)]
    pub max_files_per_owner: usize,

    #[clap(long, default_value_t = 10)]
    pub search_result_limit: usize,

    #[clap(long, default_value_t = 4)]
    pub min_search_query_length: usize,

    /// Number of records returned by /upload/list/last.
    #[clap(long, default_value_t = 5)]
    pub recent_list_limit: usize,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            data_dir: self.data_dir.clone(),
            store_dir: self.store_dir.clone(),
            temp_dir: self.temp_dir.clone(),
            db_path: self.db_path.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            access_tokens: self.access_tokens.clone(),
            max_file_size_mb: self.max_file_size_mb,
            max_files_per_owner: self.max_files_per_owner,
            search_result_limit: self.search_result_limit,
            min_search_query_length: self.min_search_query_length,
            recent_list_limit: self.recent_list_limit,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    if config.access_tokens.is_empty() {
        warn!("No access tokens configured, every protected route will answer 401");
    }

    info!("Opening metadata index at {:?}...", config.db_path);
    let index: Arc<dyn MetadataIndex> = Arc::new(SqliteMetadataIndex::new(
        &config.db_path,
        config.search_settings(),
    )?);

    info!("Using store at {:?}", config.store_dir);
    let store = Arc::new(FileStore::new(&config.store_dir));

    let ingestion = Arc::new(IngestionManager::new(
        store.clone(),
        index.clone(),
        config.ingestion_config(),
    ));
    ingestion.init()?;

    let checker = Arc::new(ConsistencyChecker::new(store, index.clone()));
    if let Err(e) = checker.check() {
        warn!("Startup consistency check: {}", e);
    }

    let token_validator = Arc::new(AllowListTokenValidator::new(
        config.access_tokens.iter().cloned(),
    ));

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
        recent_list_limit: config.limits.recent_list_limit,
        max_upload_body_size: config.max_file_size_bytes() as usize + 1024 * 1024,
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(server_config, ingestion, index, checker, token_validator).await
}
