//! Round-robin credential rotation for the text-completion service.
//!
//! Spreads call volume across several API keys so that no single key hits
//! its per-key rate limit first. The pool only distributes load: it never
//! blocks, retries, or tracks exhaustion.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info};

use crate::errors::CoreError;

/// An immutable, non-empty set of credentials with one shared cursor.
///
/// The cursor is private and only moves inside `acquire`, where the read and
/// the advance happen as a single atomic update.
#[derive(Debug)]
pub struct KeyPool {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl KeyPool {
    /// Builds the pool from credentials in priority order.
    ///
    /// Blank entries are skipped and repeats dropped (first occurrence wins).
    /// An empty result is a configuration error.
    pub fn new<I, S>(keys: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into().trim().to_string();
            if !key.is_empty() && !unique.contains(&key) {
                unique.push(key);
            }
        }

        if unique.is_empty() {
            return Err(CoreError::Configuration(
                "no text-completion API keys configured; set ANTHROPIC_API_KEY1, \
                 ANTHROPIC_API_KEY2 or ANTHROPIC_API_KEY"
                    .to_string(),
            ));
        }

        info!("Initialized key pool with {} API keys", unique.len());
        Ok(Self {
            keys: unique,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns the credential under the cursor and advances it modulo the pool size.
    pub fn acquire(&self) -> &str {
        let len = self.keys.len();
        // fetch_update yields the pre-advance value; no two callers can see the same one.
        let slot = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
            .unwrap_or_else(|c| c);
        debug!("Using API key slot {} of {}", slot + 1, len);
        &self.keys[slot]
    }
}
