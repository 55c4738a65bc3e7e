use axum::extract::FromRef;

use crate::library_store::Dataset;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type SharedDataset = Arc<Dataset>;

/// Everything a stats handler needs: the immutable dataset snapshot and
/// the deployment's genre exclusion list.
#[derive(Clone)]
pub struct StatsContext {
    pub dataset: SharedDataset,
    pub excluded_genres: Arc<HashSet<String>>,
}

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub stats: StatsContext,
    pub hash: String,
}

impl FromRef<ServerState> for StatsContext {
    fn from_ref(input: &ServerState) -> Self {
        input.stats.clone()
    }
}

impl FromRef<ServerState> for SharedDataset {
    fn from_ref(input: &ServerState) -> Self {
        input.stats.dataset.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
