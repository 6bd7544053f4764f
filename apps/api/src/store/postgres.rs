use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::models::{MatchRecord, MatchSummary, NewProfile, Profile, SkillUpdate};
use crate::store::{MatchesStore, ProfileCounts, ProfileStore};

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM participants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to load participant {id}"))?;
        Ok(profile)
    }

    async fn find_by_contact(&self, contact_address: &str) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT * FROM participants WHERE lower(contact_address) = lower($1)",
        )
        .bind(contact_address)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up participant by contact address")?;
        Ok(profile)
    }

    async fn find_all_with_skills(&self) -> Result<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, Profile>(
            "SELECT * FROM participants WHERE cardinality(skills) > 0 ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load participants with skills")?;
        Ok(profiles)
    }

    async fn insert(&self, profile: NewProfile) -> Result<Profile> {
        let profile = profile.into_profile();
        sqlx::query(
            r#"
            INSERT INTO participants
                (id, display_name, contact_address, job_title, skills,
                 resume_processed, last_processed_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(profile.id)
        .bind(&profile.display_name)
        .bind(&profile.contact_address)
        .bind(&profile.job_title)
        .bind(&profile.skills)
        .bind(profile.resume_processed)
        .bind(profile.last_processed_at)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert participant")?;

        info!("Inserted participant {}", profile.id);
        Ok(profile)
    }

    async fn upsert_skills(&self, id: Uuid, update: SkillUpdate) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE participants
            SET skills = $2, resume_processed = $3, last_processed_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.skills)
        .bind(update.resume_processed)
        .bind(update.processed_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to update skills for participant {id}"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn counts(&self) -> Result<ProfileCounts> {
        let (total_users, users_with_resumes, users_with_skills): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*),
                       COUNT(*) FILTER (WHERE resume_processed),
                       COUNT(*) FILTER (WHERE cardinality(skills) > 0)
                FROM participants
                "#,
            )
            .fetch_one(&self.pool)
            .await
            .context("Failed to count participants")?;

        Ok(ProfileCounts {
            total_users,
            users_with_resumes,
            users_with_skills,
        })
    }
}

#[derive(Clone)]
pub struct PgMatchesStore {
    pool: PgPool,
}

impl PgMatchesStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchesStore for PgMatchesStore {
    async fn insert_many(&self, records: &[MatchRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        // Append-only: one multi-row INSERT, never UPDATE.
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO match_records \
             (id, subject_id, candidate_id, similarity_score, common_skills, \
              matched_at, notification_batch_id, notification_sent) ",
        );
        builder.push_values(records, |mut row, record| {
            row.push_bind(record.id)
                .push_bind(record.subject_id)
                .push_bind(record.candidate_id)
                .push_bind(record.similarity_score)
                .push_bind(record.common_skills.clone())
                .push_bind(record.matched_at)
                .push_bind(record.notification_batch_id)
                .push_bind(record.notification_sent);
        });

        builder
            .build()
            .execute(&self.pool)
            .await
            .context("Failed to insert match records")?;
        Ok(())
    }

    async fn find_by_subject(&self, subject_id: Uuid) -> Result<Vec<MatchRecord>> {
        let records = sqlx::query_as::<_, MatchRecord>(
            "SELECT * FROM match_records WHERE subject_id = $1 ORDER BY matched_at DESC",
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load match records for {subject_id}"))?;
        Ok(records)
    }

    async fn find_involving(&self, id: Uuid) -> Result<Vec<MatchRecord>> {
        let records = sqlx::query_as::<_, MatchRecord>(
            r#"
            SELECT * FROM match_records
            WHERE subject_id = $1 OR candidate_id = $1
            ORDER BY matched_at DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load match history for {id}"))?;
        Ok(records)
    }

    async fn recent_candidates(&self, subject_id: Uuid, since: DateTime<Utc>) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT candidate_id FROM match_records
            WHERE subject_id = $1 AND matched_at >= $2
            "#,
        )
        .bind(subject_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load recent matches for {subject_id}"))?;
        Ok(ids)
    }

    async fn summary(&self) -> Result<MatchSummary> {
        let (total_matches, avg_similarity, max_similarity, min_similarity): (
            i64,
            Option<f64>,
            Option<f64>,
            Option<f64>,
        ) = sqlx::query_as(
            r#"
            SELECT COUNT(*), AVG(similarity_score), MAX(similarity_score), MIN(similarity_score)
            FROM match_records
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to summarize match records")?;

        Ok(MatchSummary {
            total_matches,
            avg_similarity,
            max_similarity,
            min_similarity,
        })
    }
}
