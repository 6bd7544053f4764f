mod bulk;
mod config;
mod db;
mod errors;
mod ingest;
mod llm_client;
mod matching;
mod models;
mod notify;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::create_pool;
use crate::ingest::{ResumeIngestor, SkillExtractor};
use crate::llm_client::{KeyPool, LlmClient, TextCompletion};
use crate::matching::{DraftSettings, MatchCoordinator, MatchSettings, MessageDrafter};
use crate::notify::{LogChannel, NotificationChannel, WebhookChannel};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{
    InMemoryMatchesStore, InMemoryProfileStore, MatchesStore, PgMatchesStore, PgProfileStore,
    ProfileStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Matchmaker API v{}", env!("CARGO_PKG_VERSION"));

    // Credentials for the text-completion service
    let keys = Arc::new(KeyPool::new(config.api_keys.clone())?);
    let llm: Arc<dyn TextCompletion> = Arc::new(LlmClient::new());
    info!(
        "LLM client initialized (model: {}, {} keys)",
        llm_client::MODEL,
        keys.len()
    );

    // Stores: PostgreSQL when configured, process memory otherwise
    let (profiles, matches): (Arc<dyn ProfileStore>, Arc<dyn MatchesStore>) =
        match &config.database_url {
            Some(url) => {
                let db = create_pool(url).await?;
                (
                    Arc::new(PgProfileStore::new(db.clone())),
                    Arc::new(PgMatchesStore::new(db)),
                )
            }
            None => {
                warn!("DATABASE_URL not set, using in-memory stores (data is lost on restart)");
                (
                    Arc::new(InMemoryProfileStore::new()),
                    Arc::new(InMemoryMatchesStore::new()),
                )
            }
        };

    // Notification channel
    let channel: Arc<dyn NotificationChannel> = match &config.notify_webhook_url {
        Some(url) => {
            info!("Delivering notifications via webhook");
            Arc::new(WebhookChannel::new(url.clone()))
        }
        None => {
            warn!("NOTIFY_WEBHOOK_URL not set, notifications are only logged");
            Arc::new(LogChannel)
        }
    };

    let skills = SkillExtractor::new(llm.clone(), keys.clone(), config.skill_extraction_delay);
    let ingestor = ResumeIngestor::new(profiles.clone(), skills, config.bulk_concurrency);

    let drafter = MessageDrafter::new(
        llm,
        keys,
        config.draft_delay,
        DraftSettings {
            event_name: config.event_name.clone(),
            community_url: config.community_url.clone(),
        },
    );
    let coordinator = MatchCoordinator::new(
        profiles.clone(),
        matches.clone(),
        drafter,
        channel,
        MatchSettings {
            threshold: config.match_threshold,
            limit: config.match_limit,
            policy: config.ranking_policy,
            renotify_cooldown: config
                .renotify_cooldown_hours
                .map(|h| chrono::Duration::hours(h as i64)),
            bulk_concurrency: config.bulk_concurrency,
        },
    );
    info!(
        "Matching: threshold {}, limit {}, ranking {:?}",
        config.match_threshold, config.match_limit, config.ranking_policy
    );

    // Build app state
    let state = AppState {
        profiles,
        matches,
        coordinator: Arc::new(coordinator),
        ingestor: Arc::new(ingestor),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
