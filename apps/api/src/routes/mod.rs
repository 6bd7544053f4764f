pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::ingest::{document::MAX_UPLOAD_BYTES, handlers as ingest};
use crate::matching::handlers as matching;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Participants
        .route("/api/v1/participants", post(ingest::handle_create_participant))
        .route("/api/v1/participants/:id", get(ingest::handle_get_participant))
        .route(
            "/api/v1/participants/:id/resume",
            post(ingest::handle_upload_resume),
        )
        .route("/api/v1/resumes/bulk", post(ingest::handle_bulk_upload))
        // Matching
        .route("/api/v1/matches/find", post(matching::handle_find_matches))
        .route("/api/v1/matches/bulk", post(matching::handle_bulk_matches))
        .route("/api/v1/matches/stats", get(matching::handle_match_stats))
        .route("/api/v1/matches/:id", get(matching::handle_match_history))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::ingest::{ResumeIngestor, SkillExtractor};
    use crate::llm_client::KeyPool;
    use crate::matching::similarity::RankingPolicy;
    use crate::matching::{DraftSettings, MatchCoordinator, MatchSettings, MessageDrafter};
    use crate::models::Profile;
    use crate::store::{InMemoryMatchesStore, InMemoryProfileStore};
    use crate::testing::{participant, FailingCompletion, RecordingChannel, ScriptedCompletion};

    const BOUNDARY: &str = "matchmaker-test-boundary";

    fn app(profiles: Vec<Profile>) -> (Router, Arc<RecordingChannel>) {
        let profiles = Arc::new(InMemoryProfileStore::with_profiles(profiles));
        let matches = Arc::new(InMemoryMatchesStore::new());
        let channel = Arc::new(RecordingChannel::default());
        let keys = Arc::new(KeyPool::new(["key"]).unwrap());

        let drafter = MessageDrafter::new(
            Arc::new(FailingCompletion),
            keys.clone(),
            Duration::ZERO,
            DraftSettings {
                event_name: "Hack Night".to_string(),
                community_url: None,
            },
        );
        let coordinator = MatchCoordinator::new(
            profiles.clone(),
            matches.clone(),
            drafter,
            channel.clone(),
            MatchSettings {
                threshold: 0.1,
                limit: 10,
                policy: RankingPolicy::OverlapFirst,
                renotify_cooldown: None,
                bulk_concurrency: 2,
            },
        );
        let skills = SkillExtractor::new(
            Arc::new(ScriptedCompletion::replying("Rust, SQL")),
            keys,
            Duration::ZERO,
        );
        let ingestor = ResumeIngestor::new(profiles.clone(), skills, 2);

        let state = AppState {
            profiles,
            matches,
            coordinator: Arc::new(coordinator),
            ingestor: Arc::new(ingestor),
        };
        (build_router(state), channel)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn multipart_request(uri: &str, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, file_name, content) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file_name {
                Some(file_name) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(Vec::new());
        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["service"], "matchmaker");
    }

    #[tokio::test]
    async fn test_create_participant_auto_matches() {
        let mate = participant("Grace", &["Rust", "Go"]);
        let (app, channel) = app(vec![mate]);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/participants",
                json!({"name": "Ada", "email": "ada@example.com", "skills": ["rust", "SQL"]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["participant"]["display_name"], "Ada");
        assert_eq!(body["match_result"]["matches_found"], 1);
        assert_eq!(channel.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let existing = participant("Ada", &[]);
        let email = existing.contact_address.clone();
        let (app, _) = app(vec![existing]);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/participants",
                json!({"name": "Ada Again", "email": email}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_get_unknown_participant_is_404() {
        let (app, _) = app(Vec::new());
        let response = app
            .oneshot(get_request(&format!("/api/v1/participants/{}", Uuid::new_v4())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_find_matches_for_skill_less_subject_is_422() {
        let subject = participant("Ada", &[]);
        let id = subject.id;
        let (app, _) = app(vec![subject]);

        let response = app
            .oneshot(json_request("POST", "/api/v1/matches/find", json!({"user_id": id})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_find_matches_rejects_bad_threshold() {
        let subject = participant("Ada", &["Rust"]);
        let id = subject.id;
        let (app, _) = app(vec![subject]);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/matches/find",
                json!({"user_id": id, "similarity_threshold": 2.0}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_resume_upload_updates_skills_and_matches() {
        let subject = participant("Ada", &[]);
        let mate = participant("Grace", &["SQL"]);
        let id = subject.id;
        let (app, channel) = app(vec![subject, mate]);

        let response = app
            .oneshot(multipart_request(
                &format!("/api/v1/participants/{id}/resume"),
                &[("resume", Some("cv.txt"), "Rust and SQL engineer")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["ingest"]["status"], "skills_updated");
        assert_eq!(body["ingest"]["total_skills"], 2);
        assert_eq!(body["match_result"]["matches_found"], 1);
        assert_eq!(channel.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_resume_upload_can_skip_matching() {
        let subject = participant("Ada", &[]);
        let mate = participant("Grace", &["SQL"]);
        let id = subject.id;
        let (app, channel) = app(vec![subject, mate]);

        let response = app
            .oneshot(multipart_request(
                &format!("/api/v1/participants/{id}/resume"),
                &[
                    ("auto_match", None, "false"),
                    ("resume", Some("cv.txt"), "Rust and SQL engineer"),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["match_result"].is_null());
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn test_resume_upload_rejects_unsupported_format() {
        let subject = participant("Ada", &[]);
        let id = subject.id;
        let (app, _) = app(vec![subject]);

        let response = app
            .oneshot(multipart_request(
                &format!("/api/v1/participants/{id}/resume"),
                &[("resume", Some("cv.odt"), "whatever")],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bulk_resume_upload_reports_per_participant() {
        let a = participant("Ada", &[]);
        let b = participant("Grace", &[]);
        let missing = Uuid::new_v4().to_string();
        let (a_id, b_id) = (a.id.to_string(), b.id.to_string());
        let (app, _) = app(vec![a, b]);

        let response = app
            .oneshot(multipart_request(
                "/api/v1/resumes/bulk",
                &[
                    (a_id.as_str(), Some("a.txt"), "Rust"),
                    (missing.as_str(), Some("x.txt"), "Rust"),
                    (b_id.as_str(), Some("b.txt"), "SQL"),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["processed"], 2);
        assert_eq!(body["failed"], 1);
        assert_eq!(body["entries"][1]["status"], "failed");
    }

    #[tokio::test]
    async fn test_bulk_resume_upload_rejects_repeated_participant() {
        let a = participant("Ada", &[]);
        let a_id = a.id.to_string();
        let (app, _) = app(vec![a]);

        let response = app
            .clone()
            .oneshot(multipart_request(
                "/api/v1/resumes/bulk",
                &[
                    (a_id.as_str(), Some("first.txt"), "Rust"),
                    (a_id.as_str(), Some("second.txt"), "SQL"),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let stored = app
            .oneshot(get_request(&format!("/api/v1/participants/{a_id}")))
            .await
            .unwrap();
        assert_eq!(body_json(stored).await["resume_processed"], false);
    }

    #[tokio::test]
    async fn test_bulk_matches_without_body() {
        let people = vec![
            participant("Ada", &["Rust"]),
            participant("Grace", &["Rust"]),
            participant("Linus", &["C"]),
        ];
        let (app, channel) = app(people);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/matches/bulk")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["processed"], 3);
        assert_eq!(body["total_matches"], 2);
        assert_eq!(channel.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_history_and_stats_after_matching() {
        let ada = participant("Ada", &["Rust", "Go"]);
        let grace = participant("Grace", &["Rust"]);
        let (ada_id, grace_id) = (ada.id, grace.id);
        let (app, _) = app(vec![ada, grace]);

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/matches/find", json!({"user_id": ada_id})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let history = app
            .clone()
            .oneshot(get_request(&format!("/api/v1/matches/{grace_id}")))
            .await
            .unwrap();
        let history = body_json(history).await;
        assert_eq!(history["total"], 1);
        assert_eq!(history["matches"][0]["subject_id"], ada_id.to_string());

        let stats = body_json(app.oneshot(get_request("/api/v1/matches/stats")).await.unwrap()).await;
        assert_eq!(stats["total_users"], 2);
        assert_eq!(stats["users_with_skills"], 2);
        assert_eq!(stats["total_matches"], 1);
        assert_eq!(stats["max_similarity"], 1.0);
    }
}
