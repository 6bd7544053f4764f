//! Resume ingestion: document in, merged skill list persisted.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::bulk::{run_isolated, BulkReport};
use crate::errors::CoreError;
use crate::ingest::document::{DocumentHandle, DocumentTextExtractor};
use crate::ingest::skills::SkillExtractor;
use crate::models::skills::merge_skills;
use crate::models::SkillUpdate;
use crate::store::ProfileStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    SkillsUpdated,
    /// Text was read but no skill could be found; the profile is untouched.
    NoSkillsExtracted,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub subject_id: Uuid,
    pub status: IngestStatus,
    /// `generated` or `fallback`.
    pub skill_source: &'static str,
    pub extracted_skills: Vec<String>,
    pub total_skills: usize,
    pub text_length: usize,
}

pub struct ResumeIngestor {
    profiles: Arc<dyn ProfileStore>,
    documents: DocumentTextExtractor,
    skills: SkillExtractor,
    bulk_concurrency: usize,
}

impl ResumeIngestor {
    pub fn new(profiles: Arc<dyn ProfileStore>, skills: SkillExtractor, bulk_concurrency: usize) -> Self {
        Self {
            profiles,
            documents: DocumentTextExtractor,
            skills,
            bulk_concurrency,
        }
    }

    /// Extracts skills from `document` and merges them into the subject's profile.
    ///
    /// Existing skills keep their casing and position; new ones are appended.
    /// Nothing is written when the document yields no skills.
    pub async fn process_document(
        &self,
        subject_id: Uuid,
        document: &DocumentHandle,
    ) -> Result<IngestReport, CoreError> {
        if self.profiles.find_by_id(subject_id).await?.is_none() {
            return Err(CoreError::ProfileNotFound(subject_id));
        }

        let text = self.documents.extract(document).await.map_err(|e| match e {
            CoreError::Extraction(msg) => {
                CoreError::Processing(format!("could not read '{}': {msg}", document.file_name))
            }
            other => other,
        })?;
        if text.trim().is_empty() {
            return Err(CoreError::Processing(format!(
                "no text could be extracted from '{}'",
                document.file_name
            )));
        }

        let sourced = self.skills.extract_skills(&text).await;
        if sourced.is_fallback() {
            info!("Skills for {subject_id} come from the fallback vocabulary");
        }
        let skill_source = sourced.label();
        let extracted = sourced.into_value();

        if extracted.is_empty() {
            warn!("No skills found in resume for {subject_id}");
            return Ok(IngestReport {
                subject_id,
                status: IngestStatus::NoSkillsExtracted,
                skill_source,
                extracted_skills: extracted,
                total_skills: 0,
                text_length: text.chars().count(),
            });
        }

        // Re-read so skills written while the extraction call was in flight survive.
        let current = self
            .profiles
            .find_by_id(subject_id)
            .await?
            .ok_or(CoreError::ProfileNotFound(subject_id))?;
        let merged = merge_skills(&current.skills, &extracted);
        let total_skills = merged.len();

        let update = SkillUpdate {
            skills: merged,
            resume_processed: true,
            processed_at: Utc::now(),
        };
        if !self.profiles.upsert_skills(subject_id, update).await? {
            return Err(CoreError::ProfileNotFound(subject_id));
        }

        info!(
            "Updated {subject_id}: {} extracted ({skill_source}), {total_skills} total",
            extracted.len()
        );

        Ok(IngestReport {
            subject_id,
            status: IngestStatus::SkillsUpdated,
            skill_source,
            extracted_skills: extracted,
            total_skills,
            text_length: text.chars().count(),
        })
    }

    /// Processes many documents; one bad document never stops the others.
    pub async fn process_documents(
        &self,
        documents: Vec<(Uuid, DocumentHandle)>,
    ) -> BulkReport<IngestReport> {
        info!("Bulk resume ingestion for {} participants", documents.len());
        run_isolated(documents, self.bulk_concurrency, |(subject_id, document)| async move {
            (subject_id, self.process_document(subject_id, &document).await)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use crate::bulk::BulkOutcome;
    use crate::llm_client::{KeyPool, TextCompletion};
    use crate::store::InMemoryProfileStore;
    use crate::testing::{participant, FailingCompletion, ScriptedCompletion};

    fn ingestor(store: Arc<InMemoryProfileStore>, llm: Arc<dyn TextCompletion>) -> ResumeIngestor {
        let keys = Arc::new(KeyPool::new(["key"]).unwrap());
        ResumeIngestor::new(store, SkillExtractor::new(llm, keys, Duration::ZERO), 3)
    }

    fn text_document(text: &str) -> DocumentHandle {
        DocumentHandle::new("resume.txt", Some("text/plain".to_string()), Bytes::from(text.to_string()))
    }

    #[tokio::test]
    async fn test_merges_into_existing_skills() {
        let subject = participant("Ada", &["python", "Node.js"]);
        let store = Arc::new(InMemoryProfileStore::with_profiles(vec![subject.clone()]));
        let ingestor = ingestor(store.clone(), Arc::new(ScriptedCompletion::replying("Python, React")));

        let report = ingestor
            .process_document(subject.id, &text_document("Python and React developer"))
            .await
            .unwrap();

        assert_eq!(report.status, IngestStatus::SkillsUpdated);
        assert_eq!(report.skill_source, "generated");
        assert_eq!(report.total_skills, 3);

        let stored = store.find_by_id(subject.id).await.unwrap().unwrap();
        assert_eq!(stored.skills, vec!["python", "Node.js", "React"]);
        assert!(stored.resume_processed);
        assert!(stored.last_processed_at.is_some());
    }

    #[tokio::test]
    async fn test_fallback_skills_are_persisted() {
        let subject = participant("Ada", &[]);
        let store = Arc::new(InMemoryProfileStore::with_profiles(vec![subject.clone()]));
        let ingestor = ingestor(store.clone(), Arc::new(FailingCompletion));

        let report = ingestor
            .process_document(subject.id, &text_document("Rust services on Kubernetes"))
            .await
            .unwrap();

        assert_eq!(report.skill_source, "fallback");
        let stored = store.find_by_id(subject.id).await.unwrap().unwrap();
        assert_eq!(stored.skills, vec!["Rust", "Kubernetes"]);
    }

    #[tokio::test]
    async fn test_unknown_subject_is_not_found() {
        let store = Arc::new(InMemoryProfileStore::new());
        let llm = Arc::new(ScriptedCompletion::replying("Rust"));
        let err = ingestor(store, llm.clone())
            .process_document(Uuid::new_v4(), &text_document("Rust"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::ProfileNotFound(_)));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_format_is_rejected() {
        let subject = participant("Ada", &[]);
        let store = Arc::new(InMemoryProfileStore::with_profiles(vec![subject.clone()]));
        let doc = DocumentHandle::new("resume.odt", None, Bytes::from_static(b"..."));

        let err = ingestor(store, Arc::new(ScriptedCompletion::replying("Rust")))
            .process_document(subject.id, &doc)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_unreadable_document_is_processing_error() {
        let subject = participant("Ada", &[]);
        let store = Arc::new(InMemoryProfileStore::with_profiles(vec![subject.clone()]));
        let doc = DocumentHandle::new("resume.docx", None, Bytes::from_static(b"not a zip"));

        let err = ingestor(store, Arc::new(ScriptedCompletion::replying("Rust")))
            .process_document(subject.id, &doc)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Processing(_)));
    }

    #[tokio::test]
    async fn test_blank_text_is_processing_error() {
        let subject = participant("Ada", &[]);
        let store = Arc::new(InMemoryProfileStore::with_profiles(vec![subject.clone()]));
        let err = ingestor(store, Arc::new(ScriptedCompletion::replying("Rust")))
            .process_document(subject.id, &text_document("  \n "))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Processing(_)));
    }

    #[tokio::test]
    async fn test_no_skills_leaves_profile_untouched() {
        let subject = participant("Ada", &["Go"]);
        let store = Arc::new(InMemoryProfileStore::with_profiles(vec![subject.clone()]));
        let ingestor = ingestor(store.clone(), Arc::new(FailingCompletion));

        let report = ingestor
            .process_document(subject.id, &text_document("I enjoy hiking and baking."))
            .await
            .unwrap();

        assert_eq!(report.status, IngestStatus::NoSkillsExtracted);
        assert_eq!(store.find_by_id(subject.id).await.unwrap().unwrap(), subject);
    }

    #[tokio::test]
    async fn test_bulk_isolates_bad_documents() {
        let subjects: Vec<_> = (0..10).map(|i| participant(&format!("P{i}"), &[])).collect();
        let store = Arc::new(InMemoryProfileStore::with_profiles(subjects.clone()));
        let ingestor = ingestor(store.clone(), Arc::new(ScriptedCompletion::replying("Rust, SQL")));

        let documents = subjects
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let doc = if i == 4 {
                    DocumentHandle::new("broken.docx", None, Bytes::from_static(b"garbage"))
                } else {
                    text_document("Rust and SQL")
                };
                (p.id, doc)
            })
            .collect();

        let report = ingestor.process_documents(documents).await;

        assert_eq!(report.processed, 9);
        assert_eq!(report.failed, 1);
        assert!(matches!(report.entries[4].outcome, BulkOutcome::Failed { .. }));
        assert_eq!(store.counts().await.unwrap().users_with_skills, 9);
    }
}
