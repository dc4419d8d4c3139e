//! Request layer: the explicitly constructed set of shared request services
//!
//! One `RequestLayer` owns the response cache, the rate-limit state, the
//! concurrency scheduler, the fetcher and the batch orchestrator. Callers
//! share it by reference (usually behind an `Arc`); [`RequestLayer::reset`]
//! returns it to a clean state between tests.

use std::future::Future;
use std::sync::Arc;

use gapfinder_common::cache::{Cache, CacheConfig, CacheStats};
use gapfinder_common::resilience::{
    ConcurrencyScheduler, RateLimitTracker, SchedulerConfig, SchedulerMetrics,
};
use gapfinder_domain::{BatchConfig, Config, FetchError, GapfinderError, Result};
use serde_json::Value;
use tracing::{debug, info};

use super::batch::{BatchOrchestrator, BatchRun};
use super::client::ResilientFetcher;
use super::request::FetchRequest;

/// Shared cache of decoded JSON responses, keyed by [`FetchRequest::cache_key`]
pub type ResponseCache = Cache<String, Value>;

pub struct RequestLayer {
    fetcher: ResilientFetcher,
    cache: ResponseCache,
    scheduler: ConcurrencyScheduler,
    batches: BatchOrchestrator,
}

impl RequestLayer {
    pub fn new(
        fetcher: ResilientFetcher,
        cache: ResponseCache,
        scheduler: ConcurrencyScheduler,
        batch: &BatchConfig,
    ) -> Self {
        let batches = BatchOrchestrator::new(scheduler.clone(), batch);
        Self { fetcher, cache, scheduler, batches }
    }

    /// Build every service from configuration.
    ///
    /// # Errors
    /// Returns `GapfinderError::Config` when the configuration is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let fetcher = ResilientFetcher::from_config(&config.requests)?;

        let settings = &config.cache;
        let cache_config =
            CacheConfig::with_ttl_minutes(settings.cache_max_size, settings.cache_ttl_minutes);
        cache_config.validate().map_err(GapfinderError::Config)?;

        let scheduler = ConcurrencyScheduler::new(SchedulerConfig {
            max_concurrent: config.requests.max_concurrent_requests,
        })
        .map_err(GapfinderError::Config)?;

        Ok(Self::new(fetcher, Cache::new(cache_config), scheduler, &config.batch))
    }

    /// Fetch through the scheduler, serving GETs from the cache when fresh.
    pub async fn fetch(&self, request: &FetchRequest) -> std::result::Result<Value, FetchError> {
        self.schedule(|| self.fetch_cached(request)).await
    }

    /// Fetch without taking a scheduler slot
    ///
    /// For use inside work that already runs in a slot (a batch task, or a
    /// closure passed to [`RequestLayer::schedule`]).
    pub async fn fetch_cached(
        &self,
        request: &FetchRequest,
    ) -> std::result::Result<Value, FetchError> {
        if !request.is_cacheable() {
            return self.fetcher.fetch(request).await;
        }

        let key = request.cache_key();
        if let Some(value) = self.cache.get(&key) {
            debug!(url = %request.url, "response cache hit");
            return Ok(value);
        }

        let value = self.fetcher.fetch(request).await?;
        self.cache.set(key, value.clone());
        Ok(value)
    }

    /// Run `task` in a scheduler slot.
    pub fn schedule<F, Fut, T>(&self, task: F) -> impl Future<Output = T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.scheduler.submit(task)
    }

    /// Fetch many requests in chunks; results keep input order.
    pub async fn run_batches(&self, requests: Vec<FetchRequest>) -> BatchRun<Value> {
        self.batches.run(requests, |request| async move { self.fetch_cached(&request).await }).await
    }

    /// Run arbitrary per-item work in chunks (see [`BatchOrchestrator::run`]).
    pub async fn run_batch<I, T, F, Fut>(&self, items: Vec<I>, task: F) -> BatchRun<T>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = std::result::Result<T, FetchError>>,
    {
        self.batches.run(items, task).await
    }

    /// Clear cached responses and any active rate-limit block.
    ///
    /// Cache counters restart from zero; the final figures are logged first.
    pub fn reset(&self) {
        info!(cache = %self.cache.stats(), "request layer reset");
        self.cache.clear();
        self.fetcher.rate_limits().reset();
    }

    pub fn rate_limits(&self) -> &Arc<RateLimitTracker> {
        self.fetcher.rate_limits()
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn scheduler_metrics(&self) -> SchedulerMetrics {
        self.scheduler.metrics()
    }

    pub fn batches(&self) -> &BatchOrchestrator {
        &self.batches
    }
}

impl std::fmt::Debug for RequestLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLayer")
            .field("cache_entries", &self.cache.len())
            .field("scheduler", &self.scheduler)
            .field("rate_limited", &self.rate_limits().is_limited())
            .finish()
    }
}
