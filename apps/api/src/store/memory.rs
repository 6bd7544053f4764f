//! Process-local stores. Used when no `DATABASE_URL` is configured and by tests.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{MatchRecord, MatchSummary, NewProfile, Profile, SkillUpdate};
use crate::store::{MatchesStore, ProfileCounts, ProfileStore};

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

/// Profiles kept in insertion order, which doubles as creation order.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<Vec<Profile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with fully-formed profiles.
    pub fn with_profiles(profiles: Vec<Profile>) -> Self {
        Self {
            profiles: RwLock::new(profiles),
        }
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>> {
        Ok(read(&self.profiles)?.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_contact(&self, contact_address: &str) -> Result<Option<Profile>> {
        Ok(read(&self.profiles)?
            .iter()
            .find(|p| p.contact_address.eq_ignore_ascii_case(contact_address))
            .cloned())
    }

    async fn find_all_with_skills(&self) -> Result<Vec<Profile>> {
        Ok(read(&self.profiles)?
            .iter()
            .filter(|p| !p.skills.is_empty())
            .cloned()
            .collect())
    }

    async fn insert(&self, profile: NewProfile) -> Result<Profile> {
        let mut profiles = write(&self.profiles)?;
        if profiles
            .iter()
            .any(|p| p.contact_address.eq_ignore_ascii_case(&profile.contact_address))
        {
            bail!("participant {} already exists", profile.contact_address);
        }
        let profile = profile.into_profile();
        profiles.push(profile.clone());
        Ok(profile)
    }

    async fn upsert_skills(&self, id: Uuid, update: SkillUpdate) -> Result<bool> {
        let mut profiles = write(&self.profiles)?;
        let Some(profile) = profiles.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        profile.skills = update.skills;
        profile.resume_processed = update.resume_processed;
        profile.last_processed_at = Some(update.processed_at);
        Ok(true)
    }

    async fn counts(&self) -> Result<ProfileCounts> {
        let profiles = read(&self.profiles)?;
        Ok(ProfileCounts {
            total_users: profiles.len() as i64,
            users_with_resumes: profiles.iter().filter(|p| p.resume_processed).count() as i64,
            users_with_skills: profiles.iter().filter(|p| !p.skills.is_empty()).count() as i64,
        })
    }
}

#[derive(Default)]
pub struct InMemoryMatchesStore {
    records: RwLock<Vec<MatchRecord>>,
}

impl InMemoryMatchesStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_records(records: Vec<MatchRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    fn newest_first(&self, pred: impl Fn(&MatchRecord) -> bool) -> Result<Vec<MatchRecord>> {
        let mut found: Vec<MatchRecord> = read(&self.records)?
            .iter()
            .filter(|r| pred(r))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.matched_at.cmp(&a.matched_at));
        Ok(found)
    }
}

#[async_trait]
impl MatchesStore for InMemoryMatchesStore {
    async fn insert_many(&self, records: &[MatchRecord]) -> Result<()> {
        write(&self.records)?.extend_from_slice(records);
        Ok(())
    }

    async fn find_by_subject(&self, subject_id: Uuid) -> Result<Vec<MatchRecord>> {
        self.newest_first(|r| r.subject_id == subject_id)
    }

    async fn find_involving(&self, id: Uuid) -> Result<Vec<MatchRecord>> {
        self.newest_first(|r| r.subject_id == id || r.candidate_id == id)
    }

    async fn summary(&self) -> Result<MatchSummary> {
        let records = read(&self.records)?;
        if records.is_empty() {
            return Ok(MatchSummary::default());
        }
        let scores = records.iter().map(|r| r.similarity_score);
        let total: f64 = scores.clone().sum();
        Ok(MatchSummary {
            total_matches: records.len() as i64,
            avg_similarity: Some(total / records.len() as f64),
            max_similarity: scores.clone().reduce(f64::max),
            min_similarity: scores.reduce(f64::min),
        })
    }
}
