//! Clock Abstraction
//!
//! Every simulated delay in playback goes through a [`Clock`]. Production code
//! uses [`TokioClock`]; tests and `--instant` playback use [`InstantClock`],
//! which returns immediately and records what it was asked to wait.
//!
//! This module is the only place in the core allowed to suspend on a timer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

/// Suspension primitive for dwell intervals
#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspend the current task for `duration`
    ///
    /// Must not block the thread; other tasks keep running.
    async fn dwell(&self, duration: Duration);
}

/// Real time, backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn dwell(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately and records every requested dwell
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct InstantClock {
    recorded: Arc<Mutex<Vec<Duration>>>,
}

impl InstantClock {
    /// Create a clock with an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Every dwell requested so far, in order
    pub fn recorded(&self) -> Vec<Duration> {
        self.recorded.lock().clone()
    }

    /// Sum of all requested dwells
    pub fn total(&self) -> Duration {
        self.recorded.lock().iter().sum()
    }
}

#[async_trait]
impl Clock for InstantClock {
    async fn dwell(&self, duration: Duration) {
        self.recorded.lock().push(duration);
        // Still a suspension point, so cancellation behaves as with real time
        tokio::task::yield_now().await;
    }
}

#[async_trait]
impl<C: Clock + ?Sized> Clock for Arc<C> {
    async fn dwell(&self, duration: Duration) {
        (**self).dwell(duration).await;
    }
}
