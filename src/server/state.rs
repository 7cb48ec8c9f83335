use axum::extract::FromRef;

use crate::consistency::ConsistencyChecker;
use crate::ingestion::IngestionManager;
use crate::metadata_index::MetadataIndex;
use std::sync::Arc;
use std::time::Instant;

use super::session::TokenValidator;
use super::ServerConfig;

pub type GuardedIngestionManager = Arc<IngestionManager>;
pub type GuardedMetadataIndex = Arc<dyn MetadataIndex>;
pub type GuardedConsistencyChecker = Arc<ConsistencyChecker>;
pub type GuardedTokenValidator = Arc<dyn TokenValidator>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub ingestion: GuardedIngestionManager,
    pub index: GuardedMetadataIndex,
    pub checker: GuardedConsistencyChecker,
    pub token_validator: GuardedTokenValidator,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedIngestionManager {
    fn from_ref(input: &ServerState) -> Self {
        input.ingestion.clone()
    }
}

impl FromRef<ServerState> for GuardedMetadataIndex {
    fn from_ref(input: &ServerState) -> Self {
        input.index.clone()
    }
}

impl FromRef<ServerState> for GuardedConsistencyChecker {
    fn from_ref(input: &ServerState) -> Self {
        input.checker.clone()
    }
}
