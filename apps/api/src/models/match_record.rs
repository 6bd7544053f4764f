use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One (subject, candidate) pairing produced by a matching run.
///
/// Append-only. Every record written by the same run shares
/// `notification_batch_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MatchRecord {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub candidate_id: Uuid,
    pub similarity_score: f64,
    pub common_skills: Vec<String>,
    pub matched_at: DateTime<Utc>,
    pub notification_batch_id: Uuid,
    pub notification_sent: bool,
}

/// Aggregate view over all stored match records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchSummary {
    pub total_matches: i64,
    pub avg_similarity: Option<f64>,
    pub max_similarity: Option<f64>,
    pub min_similarity: Option<f64>,
}
