//! Bounded-concurrency FIFO scheduler
//!
//! Caps the number of simultaneously executing tasks (fetches, in practice)
//! and queues the rest in submission order. A slot is claimed when
//! [`ConcurrencyScheduler::submit`] is *called*, not when the returned future
//! is first polled, so dispatch order is exactly submission order.
//!
//! When a running task finishes, its slot is handed directly to the oldest
//! waiter; the active count only drops when nobody is waiting. Running tasks
//! may complete in any order, and a failing task releases its slot like any
//! other.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

/// Default number of simultaneously executing tasks
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Configuration for scheduler behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Maximum number of tasks executing at once
    pub max_concurrent: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { max_concurrent: DEFAULT_MAX_CONCURRENT }
    }
}

impl SchedulerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent == 0 {
            return Err("max_concurrent must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Point-in-time view of the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerMetrics {
    /// Tasks currently executing
    pub active_count: usize,
    /// Tasks waiting for a slot
    pub queued_count: usize,
    /// Configured bound
    pub max_concurrent: usize,
    /// Tasks that ran to completion since creation
    pub completed: u64,
}

impl SchedulerMetrics {
    /// Calculate the current utilization as a fraction (0.0 to 1.0)
    pub fn utilization(&self) -> f64 {
        self.active_count as f64 / self.max_concurrent as f64
    }

    /// Check if every slot is taken
    pub fn is_at_capacity(&self) -> bool {
        self.active_count >= self.max_concurrent
    }

    /// Get a human-readable status message
    pub fn status_message(&self) -> String {
        format!(
            "Scheduler: {}/{} active ({:.1}% utilized), {} queued, {} completed",
            self.active_count,
            self.max_concurrent,
            self.utilization() * 100.0,
            self.queued_count,
            self.completed
        )
    }
}

struct SchedulerState {
    active: usize,
    queue: VecDeque<oneshot::Sender<SlotPermit>>,
}

struct Shared {
    state: Mutex<SchedulerState>,
    max_concurrent: usize,
    completed: AtomicU64,
}

impl Shared {
    fn enqueue(self: &Arc<Self>) -> Ticket {
        let mut state = self.state.lock();
        if state.active < self.max_concurrent && state.queue.is_empty() {
            state.active += 1;
            return Ticket::Ready(SlotPermit::new(Arc::clone(self)));
        }

        let (tx, rx) = oneshot::channel();
        state.queue.push_back(tx);
        debug!(queued = state.queue.len(), active = state.active, "task queued");
        Ticket::Waiting(rx)
    }

    /// Hand the slot to the oldest live waiter, or give it back.
    ///
    /// Waiters whose futures were dropped are skipped in a loop; their
    /// returned permits are disarmed so they do not release again.
    fn release(self: &Arc<Self>) {
        loop {
            let waiter = {
                let mut state = self.state.lock();
                match state.queue.pop_front() {
                    Some(waiter) => waiter,
                    None => {
                        state.active = state.active.saturating_sub(1);
                        return;
                    }
                }
            };

            match waiter.send(SlotPermit::new(Arc::clone(self))) {
                Ok(()) => return,
                Err(returned) => returned.disarm(),
            }
        }
    }
}

/// Ownership of one execution slot; releasing happens on drop
struct SlotPermit {
    shared: Option<Arc<Shared>>,
}

impl SlotPermit {
    fn new(shared: Arc<Shared>) -> Self {
        Self { shared: Some(shared) }
    }

    /// Drop without releasing; the caller keeps the slot accounted for.
    fn disarm(mut self) {
        self.shared = None;
    }
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.release();
        }
    }
}

enum Ticket {
    Ready(SlotPermit),
    Waiting(oneshot::Receiver<SlotPermit>),
}

/// FIFO scheduler bounding concurrently executing tasks
///
/// Clones share the same slots and queue.
///
/// # Examples
///
/// ```rust
/// use gapfinder_common::resilience::{ConcurrencyScheduler, SchedulerConfig};
///
/// # async fn example() -> Result<(), String> {
/// let scheduler = ConcurrencyScheduler::new(SchedulerConfig { max_concurrent: 2 })?;
///
/// let value = scheduler.submit(|| async { Ok::<_, String>(42) }).await?;
/// assert_eq!(value, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConcurrencyScheduler {
    shared: Arc<Shared>,
}

impl ConcurrencyScheduler {
    /// Create a new scheduler with the given configuration
    pub fn new(config: SchedulerConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self::with_bound(config.max_concurrent))
    }

    /// Create a scheduler with the default bound
    pub fn with_defaults() -> Self {
        Self::with_bound(DEFAULT_MAX_CONCURRENT)
    }

    fn with_bound(max_concurrent: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SchedulerState { active: 0, queue: VecDeque::new() }),
                max_concurrent,
                completed: AtomicU64::new(0),
            }),
        }
    }

    /// Submit a task for bounded execution
    ///
    /// The task's place in line is fixed by this call. The returned future
    /// waits for a slot, runs the task, and resolves to the task's output.
    /// Dropping the future before it runs gives up the place in line.
    pub fn submit<F, Fut, T>(&self, task: F) -> impl Future<Output = T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let shared = Arc::clone(&self.shared);
        let mut ticket = shared.enqueue();

        async move {
            let _permit = loop {
                match ticket {
                    Ticket::Ready(permit) => break permit,
                    Ticket::Waiting(rx) => match rx.await {
                        Ok(permit) => break permit,
                        Err(_) => ticket = shared.enqueue(),
                    },
                }
            };

            let output = task().await;
            shared.completed.fetch_add(1, Ordering::Relaxed);
            output
        }
    }

    /// Number of tasks currently executing
    pub fn active_count(&self) -> usize {
        self.shared.state.lock().active
    }

    /// Number of tasks waiting for a slot
    pub fn queued_count(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Configured concurrency bound
    pub fn max_concurrent(&self) -> usize {
        self.shared.max_concurrent
    }

    /// Get scheduler metrics
    pub fn metrics(&self) -> SchedulerMetrics {
        let state = self.shared.state.lock();
        SchedulerMetrics {
            active_count: state.active,
            queued_count: state.queue.len(),
            max_concurrent: self.shared.max_concurrent,
            completed: self.shared.completed.load(Ordering::Acquire),
        }
    }
}

impl fmt::Debug for ConcurrencyScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metrics = self.metrics();
        f.debug_struct("ConcurrencyScheduler")
            .field("max_concurrent", &metrics.max_concurrent)
            .field("active_count", &metrics.active_count)
            .field("queued_count", &metrics.queued_count)
            .finish()
    }
}
