use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::skills::{merge_skills, SkillSet};

/// A hackathon participant as held by the profile store.
///
/// Skills hold no two entries equal under trimmed, case-insensitive
/// comparison. The core only ever mutates them through `SkillUpdate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub display_name: String,
    pub contact_address: String,
    pub job_title: Option<String>,
    pub skills: Vec<String>,
    pub resume_processed: bool,
    pub last_processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn skill_set(&self) -> SkillSet<'_> {
        SkillSet::from_skills(&self.skills)
    }

    pub fn has_skills(&self) -> bool {
        !self.skill_set().is_empty()
    }

    /// Job title for display, falling back to `default` when unset.
    pub fn job_title_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.job_title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(default)
    }
}

/// A participant registration, before the store assigns identity.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub display_name: String,
    pub contact_address: String,
    pub job_title: Option<String>,
    pub skills: Vec<String>,
}

impl NewProfile {
    /// Checks required fields and normalizes the skill list.
    pub fn validated(self) -> Result<Self, CoreError> {
        for (field, value) in [
            ("name", &self.display_name),
            ("email", &self.contact_address),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::InvalidInput(format!("{field} is required")));
            }
        }
        if !self.contact_address.contains('@') {
            return Err(CoreError::InvalidInput(format!(
                "'{}' is not a valid email address",
                self.contact_address
            )));
        }

        Ok(Self {
            display_name: self.display_name.trim().to_string(),
            contact_address: self.contact_address.trim().to_string(),
            job_title: self
                .job_title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            skills: merge_skills(&[], &self.skills),
        })
    }

    pub fn into_profile(self) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            display_name: self.display_name,
            contact_address: self.contact_address,
            job_title: self.job_title,
            skills: self.skills,
            resume_processed: false,
            last_processed_at: None,
            created_at: Utc::now(),
        }
    }
}

/// The only mutation the core applies to a stored profile.
#[derive(Debug, Clone)]
pub struct SkillUpdate {
    pub skills: Vec<String>,
    pub resume_processed: bool,
    pub processed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(name: &str, email: &str, skills: &[&str]) -> NewProfile {
        NewProfile {
            display_name: name.to_string(),
            contact_address: email.to_string(),
            job_title: Some("  ".to_string()),
            skills: skills.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_validated_rejects_blank_name() {
        let err = registration("  ", "a@example.com", &[]).validated().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(msg) if msg.contains("name")));
    }

    #[test]
    fn test_validated_rejects_address_without_at() {
        assert!(registration("Ada", "ada.example.com", &[]).validated().is_err());
    }

    #[test]
    fn test_validated_dedups_skills_and_drops_blank_title() {
        let p = registration("Ada", " ada@example.com ", &["Rust", "rust", " SQL "])
            .validated()
            .unwrap();
        assert_eq!(p.contact_address, "ada@example.com");
        assert_eq!(p.skills, vec!["Rust".to_string(), "SQL".to_string()]);
        assert!(p.job_title.is_none());
    }

    #[test]
    fn test_new_profile_starts_unprocessed() {
        let profile = registration("Ada", "ada@example.com", &["Rust"])
            .validated()
            .unwrap()
            .into_profile();
        assert!(!profile.resume_processed);
        assert!(profile.last_processed_at.is_none());
        assert_eq!(profile.job_title_or("N/A"), "N/A");
    }
}
