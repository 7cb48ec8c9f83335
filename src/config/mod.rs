mod file_config;

pub use file_config::{FileConfig, LimitsConfig};

use crate::ingestion::IngestionManagerConfig;
use crate::metadata_index::SearchSettings;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub data_dir: Option<PathBuf>,
    pub store_dir: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub access_tokens: Vec<String>,
    pub max_file_size_mb: u64,
    pub max_files_per_owner: usize,
    pub search_result_limit: usize,
    pub min_search_query_length: usize,
    pub recent_list_limit: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        let limits = LimitsSettings::default();
        Self {
            data_dir: None,
            store_dir: None,
            temp_dir: None,
            db_path: None,
            port: 3002,
            logging_level: RequestsLoggingLevel::Path,
            access_tokens: Vec::new(),
            max_file_size_mb: limits.max_file_size_mb,
            max_files_per_owner: limits.max_files_per_owner,
            search_result_limit: limits.search_result_limit,
            min_search_query_length: limits.min_search_query_length,
            recent_list_limit: limits.recent_list_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitsSettings {
    pub max_file_size_mb: u64,
    pub max_files_per_owner: usize,
    pub search_result_limit: usize,
    pub min_search_query_length: usize,
    pub recent_list_limit: usize,
}

impl Default for LimitsSettings {
    fn default() -> Self {
        Self {
            max_file_size_mb: 10,
            max_files_per_owner: 10,
            search_result_limit: 10,
            min_search_query_length: 4,
            recent_list_limit: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Must be on the same filesystem as `temp_dir`.
    pub store_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub db_path: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub access_tokens: Vec<String>,
    pub limits: LimitsSettings,
}

/// Create `path` if missing; fail if something other than a directory is there.
fn ensure_directory(label: &str, path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            bail!("{} is not a directory: {:?}", label, path);
        }
        return Ok(());
    }
    std::fs::create_dir_all(path)
        .map_err(|e| anyhow::anyhow!("Failed to create {} {:?}: {}", label, path, e))
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .or_else(|| cli.data_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("data_dir must be specified via --data-dir or in config file")
            })?;
        if !data_dir.exists() {
            bail!("Data directory does not exist: {:?}", data_dir);
        }
        if !data_dir.is_dir() {
            bail!("data_dir is not a directory: {:?}", data_dir);
        }

        let store_dir = file
            .store_dir
            .map(PathBuf::from)
            .or_else(|| cli.store_dir.clone())
            .unwrap_or_else(|| data_dir.join("store"));
        let temp_dir = file
            .temp_dir
            .map(PathBuf::from)
            .or_else(|| cli.temp_dir.clone())
            .unwrap_or_else(|| data_dir.join("tmp"));
        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| data_dir.join("warehouse.db"));

        ensure_directory("store_dir", &store_dir)?;
        ensure_directory("temp_dir", &temp_dir)?;
        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }

        let port = file.port.unwrap_or(cli.port);
        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());
        let access_tokens = file
            .access_tokens
            .unwrap_or_else(|| cli.access_tokens.clone());

        let limits_file = file.limits.unwrap_or_default();
        let limits = LimitsSettings {
            max_file_size_mb: limits_file.max_file_size_mb.unwrap_or(cli.max_file_size_mb),
            max_files_per_owner: limits_file
                .max_files_per_owner
                .unwrap_or(cli.max_files_per_owner),
            search_result_limit: limits_file
                .search_result_limit
                .unwrap_or(cli.search_result_limit),
            min_search_query_length: limits_file
                .min_search_query_length
                .unwrap_or(cli.min_search_query_length),
            recent_list_limit: limits_file
                .recent_list_limit
                .unwrap_or(cli.recent_list_limit),
        };

        Ok(Self {
            data_dir,
            store_dir,
            temp_dir,
            db_path,
            port,
            logging_level,
            access_tokens,
            limits,
        })
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.limits.max_file_size_mb * 1024 * 1024
    }

    pub fn ingestion_config(&self) -> IngestionManagerConfig {
        IngestionManagerConfig {
            temp_dir: self.temp_dir.clone(),
            max_file_size: self.max_file_size_bytes(),
            max_files_per_owner: self.limits.max_files_per_owner,
        }
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            min_query_length: self.limits.min_search_query_length,
            result_limit: self.limits.search_result_limit,
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
