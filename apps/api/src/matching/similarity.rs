//! Skill-overlap similarity and candidate ranking.
//!
//! Score = |A ∩ B| / min(|A|, |B|) over normalized skill tokens. A small,
//! focused skill set fully contained in a larger one scores 1.0, so a
//! specialist ranks generalists who cover their niche at the top. This is
//! intentionally not Jaccard over the union.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{Profile, SkillSet};

/// Ordering applied to candidates that cleared the threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPolicy {
    /// Raw number of shared skills first, similarity second.
    #[default]
    OverlapFirst,
    /// Similarity first, raw overlap second.
    ScoreFirst,
}

impl FromStr for RankingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overlap" | "overlap_first" => Ok(RankingPolicy::OverlapFirst),
            "score" | "score_first" => Ok(RankingPolicy::ScoreFirst),
            other => Err(format!("unknown ranking policy '{other}' (expected 'overlap' or 'score')")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RankOptions {
    pub threshold: f64,
    pub limit: usize,
    pub policy: RankingPolicy,
}

/// One ranked candidate. Lives for a single ranking pass.
#[derive(Debug, Clone, Serialize)]
pub struct MatchCandidate {
    pub profile: Profile,
    pub similarity: f64,
    /// Shared skills in the subject's original casing and order.
    pub common_skills: Vec<String>,
    pub overlap_count: usize,
}

fn score(a: &SkillSet<'_>, b: &SkillSet<'_>) -> f64 {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }
    a.overlap_count(b) as f64 / smaller as f64
}

/// Symmetric overlap score in [0, 1]. Zero when either side is empty.
pub fn similarity(a: &[String], b: &[String]) -> f64 {
    score(&SkillSet::from_skills(a), &SkillSet::from_skills(b))
}

/// Ranks `population` against `subject`.
///
/// The subject itself and profiles without skills are skipped. Scores are
/// always recomputed from the skill lists passed in. Candidates sharing the
/// same sort key keep their population order.
pub fn rank_candidates(
    subject: &Profile,
    population: &[Profile],
    options: &RankOptions,
) -> Vec<MatchCandidate> {
    let target = subject.skill_set();
    if target.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<MatchCandidate> = population
        .iter()
        .filter(|p| p.id != subject.id)
        .filter_map(|p| {
            let theirs = p.skill_set();
            if theirs.is_empty() {
                return None;
            }
            let similarity = score(&target, &theirs);
            if similarity < options.threshold {
                return None;
            }
            let common_skills = target.common_with(&theirs);
            Some(MatchCandidate {
                profile: p.clone(),
                similarity,
                overlap_count: common_skills.len(),
                common_skills,
            })
        })
        .collect();

    // sort_by is stable: equal keys stay in population order.
    candidates.sort_by(|a, b| compare(a, b, options.policy));
    candidates.truncate(options.limit);
    candidates
}

fn compare(a: &MatchCandidate, b: &MatchCandidate, policy: RankingPolicy) -> Ordering {
    let by_overlap = b.overlap_count.cmp(&a.overlap_count);
    let by_score = b.similarity.total_cmp(&a.similarity);
    match policy {
        RankingPolicy::OverlapFirst => by_overlap.then(by_score),
        RankingPolicy::ScoreFirst => by_score.then(by_overlap),
    }
}
