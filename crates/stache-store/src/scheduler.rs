//! Batch scheduler for chunked backend calls.
//!
//! Splits an operation's items into chunks of at most the backend's
//! `max_batch_size`, dispatches them with bounded concurrency, retries
//! transient failures with exponential backoff and honors cooperative
//! cancellation between chunks.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use stache_core::{BatchResult, FailureReason, StoreError};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of chunks in flight.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Retry policy for transient backend failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, doubled for each later one
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound for a single delay
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    5000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after the given failed attempt (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let delay = self
            .initial_backoff_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_backoff_ms);
        Duration::from_millis(delay)
    }
}

/// Cooperative cancellation handle shared between a caller and a running batch.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
}

impl Cancellation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Chunks already started run to completion.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Outcome of one chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkOutcome<R> {
    /// The backend call returned
    Completed(R),
    /// The call failed after retries (or immediately when permanent)
    Failed(FailureReason),
    /// Cancellation was requested before the chunk started
    Skipped,
}

/// Report for one chunk, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkReport<R> {
    /// Position of the chunk in the operation
    pub index: usize,
    /// Identifiers carried by the chunk
    pub ids: Vec<String>,
    /// Backend calls made (0 when skipped)
    pub attempts: u32,
    pub outcome: ChunkOutcome<R>,
}

/// Split items into consecutive chunks of exactly `max_batch_size`; the last
/// chunk may be smaller.
#[must_use]
pub fn split_chunks<T>(items: &[T], max_batch_size: usize) -> Vec<&[T]> {
    items.chunks(max_batch_size.max(1)).collect()
}

/// Bounded-concurrency dispatcher for chunked backend calls.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    max_concurrency: usize,
    retry: RetryPolicy,
}

impl BatchScheduler {
    /// Create a scheduler. A concurrency of zero is treated as one.
    #[must_use]
    pub fn new(max_concurrency: usize, retry: RetryPolicy) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            retry,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run `op` over every chunk of `items`.
    ///
    /// A failed chunk never cancels its siblings. Reports come back sorted by
    /// chunk index whatever order the chunks finished in.
    pub async fn run<'a, T, R, I, F, Fut>(
        &self,
        items: &'a [T],
        max_batch_size: usize,
        id_of: I,
        cancel: &Cancellation,
        op: F,
    ) -> Vec<ChunkReport<R>>
    where
        I: Fn(&T) -> String,
        F: Fn(&'a [T]) -> Fut,
        Fut: Future<Output = Result<R, StoreError>>,
    {
        let chunks = split_chunks(items, max_batch_size);
        debug!(
            "Dispatching {} items in {} chunks (max {} per chunk, {} in flight)",
            items.len(),
            chunks.len(),
            max_batch_size,
            self.max_concurrency
        );

        let id_of = &id_of;
        let op = &op;
        let mut reports: Vec<ChunkReport<R>> = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| async move {
                let ids: Vec<String> = chunk.iter().map(id_of).collect();
                if cancel.is_cancelled() {
                    debug!("Skipping chunk {} after cancellation", index);
                    return ChunkReport {
                        index,
                        ids,
                        attempts: 0,
                        outcome: ChunkOutcome::Skipped,
                    };
                }

                let (attempts, result) = self.attempt(|| op(chunk)).await;
                let outcome = match result {
                    Ok(value) => ChunkOutcome::Completed(value),
                    Err(e) => {
                        warn!("Chunk {} failed after {} attempts: {}", index, attempts, e);
                        ChunkOutcome::Failed(e.failure_reason())
                    }
                };
                ChunkReport {
                    index,
                    ids,
                    attempts,
                    outcome,
                }
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        reports.sort_by_key(|report| report.index);
        reports
    }

    /// Run a single call under the retry policy.
    pub async fn with_retry<T, F, Fut>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        self.attempt(op).await.1
    }

    async fn attempt<T, F, Fut>(&self, mut op: F) -> (u32, Result<T, StoreError>)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        "Transient failure on attempt {}/{}, retrying in {:?}: {}",
                        attempt, max_attempts, delay, e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return (attempt, result),
            }
        }
    }
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY, RetryPolicy::default())
    }
}

/// Fold chunk reports into one [`BatchResult`].
///
/// `on_complete` receives the chunk's identifiers and the backend's value;
/// failed chunks mark every identifier failed and skipped chunks mark them
/// skipped and set `cancelled`.
pub fn aggregate<R, F>(reports: Vec<ChunkReport<R>>, mut on_complete: F) -> BatchResult
where
    F: FnMut(&mut BatchResult, Vec<String>, R),
{
    let mut result = BatchResult::new();
    for report in reports {
        match report.outcome {
            ChunkOutcome::Completed(value) => on_complete(&mut result, report.ids, value),
            ChunkOutcome::Failed(reason) => {
                for id in report.ids {
                    result.fail(id, reason.clone());
                }
            }
            ChunkOutcome::Skipped => {
                result.skipped.extend(report.ids);
                result.cancelled = true;
            }
        }
    }
    result
}
