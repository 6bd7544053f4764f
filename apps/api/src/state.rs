use std::sync::Arc;

use crate::ingest::ResumeIngestor;
use crate::matching::MatchCoordinator;
use crate::store::{MatchesStore, ProfileStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileStore>,
    pub matches: Arc<dyn MatchesStore>,
    pub coordinator: Arc<MatchCoordinator>,
    pub ingestor: Arc<ResumeIngestor>,
}
