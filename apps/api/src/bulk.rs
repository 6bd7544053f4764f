//! Per-subject failure isolation for batch operations.

use std::future::Future;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::errors::CoreError;

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BulkOutcome<T> {
    Completed { result: T },
    Failed { error: String },
}

#[derive(Debug, Serialize)]
pub struct BulkEntry<T> {
    pub subject_id: Uuid,
    #[serde(flatten)]
    pub outcome: BulkOutcome<T>,
}

#[derive(Debug, Serialize)]
pub struct BulkReport<T> {
    pub processed: usize,
    pub failed: usize,
    pub entries: Vec<BulkEntry<T>>,
}

impl<T> BulkReport<T> {
    pub fn completed(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            BulkOutcome::Completed { result } => Some(result),
            BulkOutcome::Failed { .. } => None,
        })
    }
}

/// Runs `op` over every item with at most `concurrency` in flight.
///
/// A failing item is logged and recorded in its own entry; it never stops
/// the rest of the batch. Entries come back in input order.
pub async fn run_isolated<S, T, F, Fut>(items: Vec<S>, concurrency: usize, op: F) -> BulkReport<T>
where
    F: Fn(S) -> Fut,
    Fut: Future<Output = (Uuid, Result<T, CoreError>)>,
{
    let entries: Vec<BulkEntry<T>> = stream::iter(items)
        .map(op)
        .buffered(concurrency.max(1))
        .map(|(subject_id, result)| BulkEntry {
            subject_id,
            outcome: match result {
                Ok(result) => BulkOutcome::Completed { result },
                Err(e) => {
                    warn!("Bulk item for {subject_id} failed: {e}");
                    BulkOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            },
        })
        .collect()
        .await;

    let failed = entries
        .iter()
        .filter(|e| matches!(e.outcome, BulkOutcome::Failed { .. }))
        .count();

    BulkReport {
        processed: entries.len() - failed,
        failed,
        entries,
    }
}
