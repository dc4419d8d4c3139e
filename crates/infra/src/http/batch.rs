//! Chunked execution of many requests with an inter-chunk pause
//!
//! Requests are split into consecutive chunks of `batch_size`. The requests
//! of a chunk are submitted to the shared scheduler together; the next chunk
//! starts only once every request of the current one has settled, after a
//! fixed delay. A failed request is recorded in its own result slot and never
//! cancels its siblings.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use gapfinder_common::resilience::ConcurrencyScheduler;
use gapfinder_domain::{BatchConfig, FetchError};
use tracing::{debug, info};

/// Outcome of one batch run, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRun<T> {
    pub results: Vec<Result<T, FetchError>>,
    /// Number of chunks the input was split into
    pub chunks: usize,
}

impl<T> BatchRun<T> {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|result| result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Runs work in fixed-size chunks through a [`ConcurrencyScheduler`]
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    scheduler: ConcurrencyScheduler,
    batch_size: usize,
    inter_batch_delay: Duration,
}

impl BatchOrchestrator {
    /// A `batch_size` of zero is treated as one.
    pub fn new(scheduler: ConcurrencyScheduler, config: &BatchConfig) -> Self {
        Self {
            scheduler,
            batch_size: config.batch_size.max(1),
            inter_batch_delay: Duration::from_millis(config.inter_batch_delay_ms),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn inter_batch_delay(&self) -> Duration {
        self.inter_batch_delay
    }

    /// Run `task` once per item
    ///
    /// `task` runs inside a scheduler slot, so it must not submit to the same
    /// scheduler itself.
    pub async fn run<I, T, F, Fut>(&self, items: Vec<I>, task: F) -> BatchRun<T>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let total = items.len();
        let task = &task;
        let mut results = Vec::with_capacity(total);
        let mut chunks = 0;
        let mut pending = items.into_iter().peekable();

        while pending.peek().is_some() {
            if chunks > 0 && !self.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.inter_batch_delay).await;
            }

            let chunk: Vec<I> = pending.by_ref().take(self.batch_size).collect();
            chunks += 1;
            debug!(chunk = chunks, size = chunk.len(), "starting batch chunk");

            let submitted =
                chunk.into_iter().map(|item| self.scheduler.submit(move || task(item)));
            results.extend(join_all(submitted).await);
        }

        let run = BatchRun { results, chunks };
        info!(
            total,
            chunks,
            succeeded = run.succeeded(),
            failed = run.failed(),
            "batch run complete"
        );
        run
    }
}
