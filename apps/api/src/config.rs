use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::matching::similarity::RankingPolicy;

/// Environment variables consulted for text-completion credentials, in pool order.
pub const API_KEY_SOURCES: [&str; 3] = [
    "ANTHROPIC_API_KEY1",
    "ANTHROPIC_API_KEY2",
    "ANTHROPIC_API_KEY",
];

/// Application configuration loaded from environment variables.
/// Fails at startup if a value is present but malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` runs the service on in-memory stores.
    pub database_url: Option<String>,
    /// Raw credentials gathered from `API_KEY_SOURCES`; validated by `KeyPool::new`.
    pub api_keys: Vec<String>,
    pub notify_webhook_url: Option<String>,
    pub match_threshold: f64,
    pub match_limit: usize,
    pub ranking_policy: RankingPolicy,
    pub renotify_cooldown_hours: Option<u64>,
    pub skill_extraction_delay: Duration,
    pub draft_delay: Duration,
    pub bulk_concurrency: usize,
    pub event_name: String,
    pub community_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_keys = API_KEY_SOURCES
            .iter()
            .filter_map(|key| optional_env(key))
            .collect();

        let match_threshold: f64 = parse_env("MATCH_THRESHOLD", 0.1)?;
        if !(0.0..=1.0).contains(&match_threshold) {
            bail!("MATCH_THRESHOLD must be between 0 and 1, got {match_threshold}");
        }

        let match_limit: usize = parse_env("MATCH_LIMIT", 10)?;
        if match_limit == 0 {
            bail!("MATCH_LIMIT must be greater than zero");
        }

        let bulk_concurrency: usize = parse_env("BULK_CONCURRENCY", 4)?;

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            api_keys,
            notify_webhook_url: optional_env("NOTIFY_WEBHOOK_URL"),
            match_threshold,
            match_limit,
            ranking_policy: parse_env("MATCH_RANKING", RankingPolicy::OverlapFirst)?,
            renotify_cooldown_hours: cooldown_hours(optional_env("RENOTIFY_COOLDOWN_HOURS"))?,
            skill_extraction_delay: Duration::from_millis(parse_env(
                "SKILL_EXTRACTION_DELAY_MS",
                7000,
            )?),
            draft_delay: Duration::from_millis(parse_env("DRAFT_DELAY_MS", 6000)?),
            bulk_concurrency: bulk_concurrency.max(1),
            event_name: optional_env("EVENT_NAME").unwrap_or_else(|| "the hackathon".to_string()),
            community_url: optional_env("COMMUNITY_URL"),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Reads a variable, treating blank values the same as unset ones.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Ten years; longer windows add nothing and overflow date arithmetic.
const MAX_COOLDOWN_HOURS: u64 = 24 * 365 * 10;

fn cooldown_hours(raw: Option<String>) -> Result<Option<u64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let hours: u64 = raw
        .parse()
        .context("RENOTIFY_COOLDOWN_HOURS must be a whole number of hours")?;
    if hours > MAX_COOLDOWN_HOURS {
        bail!("RENOTIFY_COOLDOWN_HOURS must be at most {MAX_COOLDOWN_HOURS}, got {hours}");
    }
    Ok(Some(hours))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has invalid value '{raw}': {e}")),
        None => Ok(default),
    }
}
