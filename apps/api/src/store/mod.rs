//! Storage contracts the matching core depends on.
//!
//! Both stores are expected to provide per-row atomic writes; the core never
//! spans a transaction across several participants.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{MatchRecord, MatchSummary, NewProfile, Profile, SkillUpdate};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryMatchesStore, InMemoryProfileStore};
pub use postgres::{PgMatchesStore, PgProfileStore};

/// Participant population counters for the stats endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileCounts {
    pub total_users: i64,
    pub users_with_resumes: i64,
    pub users_with_skills: i64,
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>>;

    async fn find_by_contact(&self, contact_address: &str) -> Result<Option<Profile>>;

    /// Every profile with a non-empty skill list, ordered by creation time then id.
    async fn find_all_with_skills(&self) -> Result<Vec<Profile>>;

    async fn insert(&self, profile: NewProfile) -> Result<Profile>;

    /// Replaces the skill list and processing flags. Returns `false` when no
    /// profile has `id`.
    async fn upsert_skills(&self, id: Uuid, update: SkillUpdate) -> Result<bool>;

    async fn counts(&self) -> Result<ProfileCounts>;
}

#[async_trait]
pub trait MatchesStore: Send + Sync {
    /// Pure append. An empty slice is a no-op.
    async fn insert_many(&self, records: &[MatchRecord]) -> Result<()>;

    /// Records where `subject_id` was the subject, newest first.
    async fn find_by_subject(&self, subject_id: Uuid) -> Result<Vec<MatchRecord>>;

    /// Records where `id` appears on either side, newest first.
    async fn find_involving(&self, id: Uuid) -> Result<Vec<MatchRecord>>;

    /// Candidates recorded against `subject_id` at or after `since`.
    async fn recent_candidates(&self, subject_id: Uuid, since: DateTime<Utc>) -> Result<Vec<Uuid>> {
        Ok(self
            .find_by_subject(subject_id)
            .await?
            .into_iter()
            .filter(|r| r.matched_at >= since)
            .map(|r| r.candidate_id)
            .collect())
    }

    async fn summary(&self) -> Result<MatchSummary>;
}
