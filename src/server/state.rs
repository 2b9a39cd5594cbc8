use axum::extract::FromRef;

use crate::catalog::CatalogManager;
use crate::search::SearchEngine;
use std::time::Instant;

use super::ServerConfig;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub catalog: CatalogManager,
    pub search: SearchEngine,
    pub hash: String,
}

impl FromRef<ServerState> for CatalogManager {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog.clone()
    }
}

impl FromRef<ServerState> for SearchEngine {
    fn from_ref(input: &ServerState) -> Self {
        input.search.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
