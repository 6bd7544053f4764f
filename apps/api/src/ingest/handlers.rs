//! Axum route handlers for participants and resume uploads.

use std::collections::HashSet;

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::bulk::BulkReport;
use crate::errors::AppError;
use crate::ingest::document::DocumentHandle;
use crate::ingest::pipeline::{IngestReport, IngestStatus};
use crate::matching::coordinator::{MatchRequest, MatchRunReport};
use crate::models::{NewProfile, Profile};
use crate::state::AppState;

const RESUME_FIELD: &str = "resume";
const AUTO_MATCH_FIELD: &str = "auto_match";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateParticipantRequest {
    pub name: String,
    pub email: String,
    pub job_title: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub auto_match: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ParticipantResponse {
    pub participant: Profile,
    /// Present when a matching run followed the write.
    pub match_result: Option<MatchRunReport>,
}

#[derive(Debug, Serialize)]
pub struct ResumeUploadResponse {
    pub ingest: IngestReport,
    pub match_result: Option<MatchRunReport>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/participants
///
/// Registers a participant. With skills and `auto_match` (default on), a
/// matching run follows immediately.
pub async fn handle_create_participant(
    State(state): State<AppState>,
    Json(req): Json<CreateParticipantRequest>,
) -> Result<(StatusCode, Json<ParticipantResponse>), AppError> {
    let registration = NewProfile {
        display_name: req.name,
        contact_address: req.email,
        job_title: req.job_title,
        skills: req.skills,
    }
    .validated()?;

    if state
        .profiles
        .find_by_contact(&registration.contact_address)
        .await?
        .is_some()
    {
        return Err(AppError::Validation(format!(
            "A participant with email {} is already registered",
            registration.contact_address
        )));
    }

    let participant = state.profiles.insert(registration).await?;
    info!("Registered participant {}", participant.id);

    let match_result = if req.auto_match.unwrap_or(true) && participant.has_skills() {
        auto_match(&state, participant.id).await
    } else {
        None
    };

    Ok((
        StatusCode::CREATED,
        Json(ParticipantResponse {
            participant,
            match_result,
        }),
    ))
}

/// GET /api/v1/participants/:id
pub async fn handle_get_participant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Profile>, AppError> {
    let participant = state
        .profiles
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Participant {id} not found")))?;
    Ok(Json(participant))
}

/// POST /api/v1/participants/:id/resume
///
/// Multipart upload: file field `resume`, optional text field `auto_match`.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ResumeUploadResponse>, AppError> {
    let mut document = None;
    let mut auto_match_requested = true;

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(RESUME_FIELD) => document = Some(read_document(field).await?),
            Some(AUTO_MATCH_FIELD) => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                auto_match_requested = parse_flag(&raw)?;
            }
            _ => {}
        }
    }

    let document = document
        .ok_or_else(|| AppError::Validation(format!("missing multipart field '{RESUME_FIELD}'")))?;

    let ingest = state.ingestor.process_document(id, &document).await?;

    let match_result = if auto_match_requested && ingest.status == IngestStatus::SkillsUpdated {
        auto_match(&state, id).await
    } else {
        None
    };

    Ok(Json(ResumeUploadResponse {
        ingest,
        match_result,
    }))
}

/// POST /api/v1/resumes/bulk
///
/// Multipart upload where every field is a file named by the participant id
/// it belongs to.
pub async fn handle_bulk_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BulkReport<IngestReport>>, AppError> {
    let mut documents = Vec::new();
    let mut seen = HashSet::new();

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        let subject_id = Uuid::parse_str(&name).map_err(|_| {
            AppError::Validation(format!("field name '{name}' is not a participant id"))
        })?;
        // Two documents for one participant would race on the same skill merge.
        if !seen.insert(subject_id) {
            return Err(AppError::Validation(format!(
                "participant {subject_id} appears more than once"
            )));
        }
        documents.push((subject_id, read_document(field).await?));
    }

    if documents.is_empty() {
        return Err(AppError::Validation("no resumes uploaded".to_string()));
    }

    Ok(Json(state.ingestor.process_documents(documents).await))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Matching after a write is best-effort; the write already succeeded.
async fn auto_match(state: &AppState, id: Uuid) -> Option<MatchRunReport> {
    match state
        .coordinator
        .find_and_notify(id, &MatchRequest::default())
        .await
    {
        Ok(report) => Some(report),
        Err(e) => {
            warn!("Automatic matching for {id} failed: {e}");
            None
        }
    }
}

async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))
}

async fn read_document(field: Field<'_>) -> Result<DocumentHandle, AppError> {
    let file_name = field
        .file_name()
        .map(str::to_string)
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::Validation("uploaded file has no file name".to_string()))?;
    let content_type = field.content_type().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("could not read upload: {e}")))?;

    Ok(DocumentHandle::new(file_name, content_type, bytes))
}

fn parse_flag(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(AppError::Validation(format!(
            "'{other}' is not a valid value for {AUTO_MATCH_FIELD}"
        ))),
    }
}
