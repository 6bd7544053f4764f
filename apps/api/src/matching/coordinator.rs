//! Match coordination: one subject in, one consolidated notification out.
//!
//! Stages run strictly in order: load, rank, draft, deliver, persist. The
//! drafter never fails, delivery is attempted exactly once per run, and every
//! record of a run shares one batch id.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::bulk::{run_isolated, BulkReport};
use crate::errors::CoreError;
use crate::matching::draft::{similarity_percent, subject_line, MessageDrafter};
use crate::matching::similarity::{rank_candidates, MatchCandidate, RankOptions, RankingPolicy};
use crate::models::MatchRecord;
use crate::notify::NotificationChannel;
use crate::store::{MatchesStore, ProfileStore};

#[derive(Debug, Clone)]
pub struct MatchSettings {
    pub threshold: f64,
    pub limit: usize,
    pub policy: RankingPolicy,
    /// Candidates already recorded against the subject inside this window are
    /// left out of the next run. `None` disables suppression.
    pub renotify_cooldown: Option<chrono::Duration>,
    pub bulk_concurrency: usize,
}

/// Per-call overrides of the configured threshold and limit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchRequest {
    pub similarity_threshold: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    pub candidate_id: Uuid,
    pub name: String,
    pub email: String,
    pub job_title: Option<String>,
    pub similarity: f64,
    pub similarity_percent: u32,
    pub common_skills: Vec<String>,
}

impl From<&MatchCandidate> for CandidateSummary {
    fn from(c: &MatchCandidate) -> Self {
        Self {
            candidate_id: c.profile.id,
            name: c.profile.display_name.clone(),
            email: c.profile.contact_address.clone(),
            job_title: c.profile.job_title.clone(),
            similarity: c.similarity,
            similarity_percent: similarity_percent(c.similarity),
            common_skills: c.common_skills.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchRunReport {
    pub subject_id: Uuid,
    pub matches_found: usize,
    /// 1 when the consolidated message was accepted, else 0.
    pub notifications_sent: usize,
    pub notification_error: Option<String>,
    /// Set when the records of a delivered run could not be stored.
    pub persist_error: Option<String>,
    /// Messages a one-per-match scheme would have needed beyond this one.
    pub api_calls_saved: usize,
    /// Candidates skipped because they were notified inside the cooldown window.
    pub suppressed_recent: usize,
    pub draft_source: Option<&'static str>,
    pub batch_id: Option<Uuid>,
    pub candidates: Vec<CandidateSummary>,
}

impl MatchRunReport {
    fn empty(subject_id: Uuid, suppressed_recent: usize) -> Self {
        Self {
            subject_id,
            matches_found: 0,
            notifications_sent: 0,
            notification_error: None,
            persist_error: None,
            api_calls_saved: 0,
            suppressed_recent,
            draft_source: None,
            batch_id: None,
            candidates: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BulkMatchReport {
    pub total_matches: usize,
    pub total_notifications: usize,
    #[serde(flatten)]
    pub report: BulkReport<MatchRunReport>,
}

/// Start of the suppression window, clamped to the earliest representable instant.
fn cooldown_start(cooldown: chrono::Duration) -> DateTime<Utc> {
    Utc::now()
        .checked_sub_signed(cooldown)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub struct MatchCoordinator {
    profiles: Arc<dyn ProfileStore>,
    matches: Arc<dyn MatchesStore>,
    drafter: MessageDrafter,
    channel: Arc<dyn NotificationChannel>,
    settings: MatchSettings,
}

impl MatchCoordinator {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        matches: Arc<dyn MatchesStore>,
        drafter: MessageDrafter,
        channel: Arc<dyn NotificationChannel>,
        settings: MatchSettings,
    ) -> Self {
        Self {
            profiles,
            matches,
            drafter,
            channel,
            settings,
        }
    }

    fn rank_options(&self, request: &MatchRequest) -> Result<RankOptions, CoreError> {
        let threshold = request.similarity_threshold.unwrap_or(self.settings.threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(CoreError::InvalidInput(format!(
                "similarity_threshold must be between 0 and 1, got {threshold}"
            )));
        }
        let limit = request.limit.unwrap_or(self.settings.limit);
        if limit == 0 {
            return Err(CoreError::InvalidInput("limit must be at least 1".to_string()));
        }
        Ok(RankOptions {
            threshold,
            limit,
            policy: self.settings.policy,
        })
    }

    /// Finds the subject's best teammates and sends them as one message.
    ///
    /// A delivery failure is reported in the result, not as an error: the
    /// matches were found and are persisted with `notification_sent = false`.
    pub async fn find_and_notify(
        &self,
        subject_id: Uuid,
        request: &MatchRequest,
    ) -> Result<MatchRunReport, CoreError> {
        let options = self.rank_options(request)?;

        // Load
        let subject = self
            .profiles
            .find_by_id(subject_id)
            .await?
            .ok_or(CoreError::ProfileNotFound(subject_id))?;
        if !subject.has_skills() {
            return Err(CoreError::SkillsMissing(subject_id));
        }

        // Rank
        let mut population = self.profiles.find_all_with_skills().await?;
        let suppressed_recent = match self.settings.renotify_cooldown {
            Some(cooldown) => {
                let recent: HashSet<Uuid> = self
                    .matches
                    .recent_candidates(subject_id, cooldown_start(cooldown))
                    .await?
                    .into_iter()
                    .collect();
                let before = population.len();
                population.retain(|p| !recent.contains(&p.id));
                before - population.len()
            }
            None => 0,
        };

        let candidates = rank_candidates(&subject, &population, &options);
        if candidates.is_empty() {
            info!("No matches for {subject_id} at threshold {}", options.threshold);
            return Ok(MatchRunReport::empty(subject_id, suppressed_recent));
        }

        // Draft
        let body = self.drafter.draft(&subject, &candidates).await;

        // Deliver
        let delivery = self
            .channel
            .send(&subject.contact_address, &subject_line(candidates.len()), body.value())
            .await;
        let notification_error = match delivery {
            Ok(()) => None,
            Err(e) => {
                warn!("Notification to {} failed: {e}", subject.contact_address);
                Some(e.to_string())
            }
        };
        let notification_sent = notification_error.is_none();

        // Persist
        let batch_id = Uuid::new_v4();
        let matched_at = Utc::now();
        let records: Vec<MatchRecord> = candidates
            .iter()
            .map(|c| MatchRecord {
                id: Uuid::new_v4(),
                subject_id,
                candidate_id: c.profile.id,
                similarity_score: c.similarity,
                common_skills: c.common_skills.clone(),
                matched_at,
                notification_batch_id: batch_id,
                notification_sent,
            })
            .collect();
        // The message is already out; a storage failure must not turn the run into an error.
        let persist_error = match self.matches.insert_many(&records).await {
            Ok(()) => None,
            Err(e) => {
                error!("Failed to store batch {batch_id} for {subject_id}: {e:#}");
                Some(e.to_string())
            }
        };

        info!(
            "Matched {subject_id} with {} candidates in batch {batch_id} (sent: {notification_sent})",
            candidates.len()
        );

        Ok(MatchRunReport {
            subject_id,
            matches_found: candidates.len(),
            notifications_sent: usize::from(notification_sent),
            notification_error,
            persist_error,
            api_calls_saved: candidates.len().saturating_sub(1),
            suppressed_recent,
            draft_source: Some(body.label()),
            batch_id: Some(batch_id),
            candidates: candidates.iter().map(CandidateSummary::from).collect(),
        })
    }

    /// Runs `find_and_notify` for every participant with skills.
    pub async fn run_bulk(&self, request: &MatchRequest) -> Result<BulkMatchReport, CoreError> {
        self.rank_options(request)?;
        let subjects: Vec<Uuid> = self
            .profiles
            .find_all_with_skills()
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        info!("Bulk matching for {} participants", subjects.len());

        let report = run_isolated(subjects, self.settings.bulk_concurrency, |id| async move {
            (id, self.find_and_notify(id, request).await)
        })
        .await;

        Ok(BulkMatchReport {
            total_matches: report.completed().map(|r| r.matches_found).sum(),
            total_notifications: report.completed().map(|r| r.notifications_sent).sum(),
            report,
        })
    }
}
