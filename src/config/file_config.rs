use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub data_dir: Option<String>,
    pub store_dir: Option<String>,
    pub temp_dir: Option<String>,
    pub db_path: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub access_tokens: Option<Vec<String>>,

    pub limits: Option<LimitsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_file_size_mb: Option<u64>,
    pub max_files_per_owner: Option<usize>,
    pub search_result_limit: Option<usize>,
    pub min_search_query_length: Option<usize>,
    pub recent_list_limit: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
