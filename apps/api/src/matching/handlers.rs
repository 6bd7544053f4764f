//! Axum route handlers for the Matching API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::coordinator::{BulkMatchReport, MatchRequest, MatchRunReport};
use crate::models::{MatchRecord, MatchSummary};
use crate::state::AppState;
use crate::store::ProfileCounts;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindMatchesRequest {
    pub user_id: Uuid,
    pub similarity_threshold: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct MatchHistoryResponse {
    pub user_id: Uuid,
    pub total: usize,
    pub matches: Vec<MatchRecord>,
}

#[derive(Debug, Serialize)]
pub struct MatchStatsResponse {
    #[serde(flatten)]
    pub participants: ProfileCounts,
    #[serde(flatten)]
    pub matches: MatchSummary,
}

/// POST /api/v1/matches/find
pub async fn handle_find_matches(
    State(state): State<AppState>,
    Json(req): Json<FindMatchesRequest>,
) -> Result<Json<MatchRunReport>, AppError> {
    let request = MatchRequest {
        similarity_threshold: req.similarity_threshold,
        limit: req.limit,
    };
    let report = state.coordinator.find_and_notify(req.user_id, &request).await?;
    Ok(Json(report))
}

/// POST /api/v1/matches/bulk
///
/// Body is optional; an absent body uses the configured threshold and limit.
pub async fn handle_bulk_matches(
    State(state): State<AppState>,
    body: Option<Json<MatchRequest>>,
) -> Result<Json<BulkMatchReport>, AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let report = state.coordinator.run_bulk(&request).await?;
    Ok(Json(report))
}

/// GET /api/v1/matches/:id
///
/// Every record the participant appears in, on either side, newest first.
pub async fn handle_match_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchHistoryResponse>, AppError> {
    if state.profiles.find_by_id(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Participant {id} not found")));
    }
    let matches = state.matches.find_involving(id).await?;
    Ok(Json(MatchHistoryResponse {
        user_id: id,
        total: matches.len(),
        matches,
    }))
}

/// GET /api/v1/matches/stats
pub async fn handle_match_stats(
    State(state): State<AppState>,
) -> Result<Json<MatchStatsResponse>, AppError> {
    Ok(Json(MatchStatsResponse {
        participants: state.profiles.counts().await?,
        matches: state.matches.summary().await?,
    }))
}
