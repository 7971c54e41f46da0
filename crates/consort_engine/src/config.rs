//! Engine configuration: cluster search limits, cancellation, and clocks.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Minimum cluster size used when neither the rule set nor the search
/// configuration sets one. Singletons are trivially compatible, so they are
/// only reported on request.
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 2;

// =============================================================================
// Search Configuration
// =============================================================================

/// Limits for a cluster search.
///
/// Size bounds set here override the ones declared by the cluster rule set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchConfig {
    /// Keep at most this many clusters (deterministic truncation).
    pub max_clusters: Option<usize>,
    /// Override for the minimum cluster size.
    pub min_cluster_size: Option<usize>,
    /// Override for the maximum cluster size.
    pub max_cluster_size: Option<usize>,
}

impl SearchConfig {
    /// Creates an unbounded configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of returned clusters.
    #[must_use]
    pub fn with_max_clusters(mut self, max: usize) -> Self {
        self.max_clusters = Some(max);
        self
    }

    /// Overrides the minimum cluster size.
    #[must_use]
    pub fn with_min_cluster_size(mut self, min: usize) -> Self {
        self.min_cluster_size = Some(min);
        self
    }

    /// Overrides the maximum cluster size.
    #[must_use]
    pub fn with_max_cluster_size(mut self, max: usize) -> Self {
        self.max_cluster_size = Some(max);
        self
    }
}

// =============================================================================
// Cancellation
// =============================================================================

/// Cooperative cancellation, polled by the cluster search at every branch.
pub trait Cancellation: Send + Sync {
    /// Returns true once the search should stop.
    fn should_stop(&self) -> bool;
}

/// Never stops.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn should_stop(&self) -> bool {
        false
    }
}

/// Stops once a point in time has passed.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Stops at `at`.
    #[must_use]
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    /// Stops `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self::at(Instant::now() + budget)
    }
}

impl Cancellation for Deadline {
    fn should_stop(&self) -> bool {
        Instant::now() >= self.at
    }
}

/// Stops when a shared flag is raised, typically from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a lowered flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true if the flag has been raised.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Cancellation for CancelFlag {
    fn should_stop(&self) -> bool {
        self.is_cancelled()
    }
}

impl<F> Cancellation for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn should_stop(&self) -> bool {
        self()
    }
}

// =============================================================================
// Clock
// =============================================================================

/// Source of comparison timestamps, in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current time.
    fn now_millis(&self) -> u64;
}

/// Reads the system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Always returns the same instant, for reproducible output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}
