//! Huddle - the playback facade
//!
//! A [`Huddle`] ties the advisory backend, the playback scheduler and the
//! timeline together. Surfaces submit text through [`Huddle::submit`] and
//! observe the timeline through snapshots ([`Huddle::subscribe`],
//! [`Huddle::stream`]) or deltas ([`Huddle::subscribe_updates`]).
//!
//! # Cycle lifecycle
//!
//! ```text
//! submit ─► UserSubmitted ─► backend.chat ─┬─► ResponseReceived ─► turns ─► StreamCompleted
//!                                          └─► FallbackShown (network or schema failure)
//! ```
//!
//! Only one cycle runs at a time. A submission while another is in flight is
//! rejected with [`SubmitError::Busy`]. If the future returned by `submit` is
//! dropped part-way, the cycle is aborted: the placeholder is removed and the
//! timeline goes back to idle. [`Huddle::snapshot`] and the update channel see
//! the abort immediately; watch receivers see it once the runtime next
//! schedules the publishing task.
//!
//! # Cost
//!
//! Every event publishes a full copy of the timeline to the watch channel, and
//! the timeline keeps every message of the session. Publishing is therefore
//! linear in the number of messages shown so far. Long-lived surfaces that only
//! need deltas should use [`Huddle::subscribe_updates`].

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::WatchStream;

use crate::backend::{AdvisorBackend, BackendError};
use crate::clock::Clock;
use crate::events::{PlaybackEvent, TimelineUpdate};
use crate::messages::{CycleId, DisplayMessage, PlaybackState};
use crate::normalizer::normalize_all;
use crate::response::ConversationResponse;
use crate::scheduler::{EventSink, PlaybackConfig, PlaybackReport, PlaybackScheduler};
use crate::timeline::{Timeline, TimelineError, TimelineSnapshot};

/// Capacity of the update broadcast channel
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Submission refused before a cycle started
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// Another cycle is in flight
    #[error("advisors are still responding")]
    Busy,

    /// Nothing to send
    #[error("message is empty")]
    EmptyMessage,

    /// The timeline refused an event
    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

/// How a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The conversation was played
    Played(PlaybackReport),
    /// The backend failed; the apology message was shown
    Fallback(BackendError),
}

impl CycleOutcome {
    /// True when the conversation was played
    pub fn is_played(&self) -> bool {
        matches!(self, Self::Played(_))
    }
}

/// Huddle configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuddleConfig {
    /// Bound on one backend request
    pub request_timeout: Duration,
    /// Dwell intervals
    pub playback: PlaybackConfig,
}

impl Default for HuddleConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            playback: PlaybackConfig::default(),
        }
    }
}

// ============================================================================
// Timeline store
// ============================================================================

/// Shared, observable timeline
///
/// Applies events under a short lock and publishes the result. The lock is
/// never held across an `.await`.
pub struct TimelineStore {
    timeline: Mutex<Timeline>,
    snapshots: watch::Sender<TimelineSnapshot>,
    updates: broadcast::Sender<TimelineUpdate>,
}

impl TimelineStore {
    /// Create an empty store
    pub fn new() -> Self {
        let (snapshots, _) = watch::channel(TimelineSnapshot::default());
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            timeline: Mutex::new(Timeline::new()),
            snapshots,
            updates,
        }
    }

    /// Receiver that always holds the latest snapshot
    pub fn subscribe(&self) -> watch::Receiver<TimelineSnapshot> {
        self.snapshots.subscribe()
    }

    /// Snapshots as a stream, starting with the current one
    pub fn stream(&self) -> WatchStream<TimelineSnapshot> {
        WatchStream::new(self.subscribe())
    }

    /// Every applied event, with the message it appended
    pub fn subscribe_updates(&self) -> broadcast::Receiver<TimelineUpdate> {
        self.updates.subscribe()
    }

    /// Copy of the current timeline
    pub fn snapshot(&self) -> TimelineSnapshot {
        self.timeline.lock().snapshot()
    }

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.timeline.lock().state()
    }

    /// Cycle currently running
    pub fn current_cycle(&self) -> Option<CycleId> {
        self.timeline.lock().current_cycle()
    }
}

impl Default for TimelineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineStore {
    fn apply(
        timeline: &mut Timeline,
        event: &PlaybackEvent,
    ) -> Result<Option<DisplayMessage>, TimelineError> {
        timeline.apply(event).map_err(|e| {
            tracing::warn!(event = event.name(), error = %e, "Timeline rejected event");
            e
        })
    }

    /// Publish the current timeline to snapshot observers
    fn publish(&self) {
        let timeline = self.timeline.lock();
        self.snapshots.send_replace(timeline.snapshot());
    }

    /// Abort a cycle from synchronous drop code
    ///
    /// The timeline and the update channel change at once. The snapshot is
    /// published from a spawned task when a runtime is available, since the
    /// dropping thread may still hold a `watch::Ref` on it.
    fn abort_detached(self: &Arc<Self>, cycle: CycleId) {
        let event = PlaybackEvent::StreamAborted { cycle };
        {
            let mut timeline = self.timeline.lock();
            let Ok(appended) = Self::apply(&mut timeline, &event) else {
                return;
            };
            let _ = self.updates.send(TimelineUpdate { event, appended });
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = Arc::clone(self);
                handle.spawn(async move { store.publish() });
            }
            Err(_) => self.publish(),
        }
    }
}

impl EventSink for TimelineStore {
    fn emit(&self, event: PlaybackEvent) -> Result<(), TimelineError> {
        let mut timeline = self.timeline.lock();
        let appended = Self::apply(&mut timeline, &event)?;

        // Publish under the lock so observers see events in apply order
        self.snapshots.send_replace(timeline.snapshot());
        // No subscribers is fine
        let _ = self.updates.send(TimelineUpdate { event, appended });
        Ok(())
    }
}

/// Aborts the cycle if the submitting future goes away early
struct CycleGuard<'a> {
    store: &'a Arc<TimelineStore>,
    in_flight: &'a AtomicBool,
    cycle: CycleId,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if self.store.current_cycle() == Some(self.cycle) {
            tracing::warn!(cycle = %self.cycle, "Cycle abandoned, aborting playback");
            self.store.abort_detached(self.cycle);
        }
        self.in_flight.store(false, Ordering::Release);
    }
}

// ============================================================================
// Huddle
// ============================================================================

/// The advisory team, played back as a live conversation
pub struct Huddle<B: AdvisorBackend, C: Clock> {
    backend: Arc<B>,
    scheduler: PlaybackScheduler<C>,
    store: Arc<TimelineStore>,
    in_flight: AtomicBool,
    request_timeout: Duration,
}

impl<B: AdvisorBackend, C: Clock> Huddle<B, C> {
    /// Create a huddle around a backend and a clock
    pub fn new(backend: B, clock: C, config: HuddleConfig) -> Self {
        Self::with_shared_backend(Arc::new(backend), clock, config)
    }

    /// Create a huddle around a backend shared with other owners
    pub fn with_shared_backend(backend: Arc<B>, clock: C, config: HuddleConfig) -> Self {
        Self {
            backend,
            scheduler: PlaybackScheduler::new(config.playback, clock),
            store: Arc::new(TimelineStore::new()),
            in_flight: AtomicBool::new(false),
            request_timeout: config.request_timeout,
        }
    }

    /// The backend
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// The scheduler
    pub fn scheduler(&self) -> &PlaybackScheduler<C> {
        &self.scheduler
    }

    /// The shared timeline store
    pub fn store(&self) -> Arc<TimelineStore> {
        Arc::clone(&self.store)
    }

    /// Receiver that always holds the latest snapshot
    pub fn subscribe(&self) -> watch::Receiver<TimelineSnapshot> {
        self.store.subscribe()
    }

    /// Snapshots as a stream
    pub fn stream(&self) -> WatchStream<TimelineSnapshot> {
        self.store.stream()
    }

    /// Applied events, as deltas
    pub fn subscribe_updates(&self) -> broadcast::Receiver<TimelineUpdate> {
        self.store.subscribe_updates()
    }

    /// Copy of the current timeline
    pub fn snapshot(&self) -> TimelineSnapshot {
        self.store.snapshot()
    }

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.store.state()
    }

    /// Check the backend
    pub async fn health_check(&self) -> bool {
        self.backend.health_check().await
    }

    /// Send the user's message and play the team's reply
    ///
    /// Returns once the whole cycle has been revealed or the fallback message
    /// has been shown. Backend failures are not errors here; they end the
    /// cycle with [`CycleOutcome::Fallback`].
    ///
    /// Dropping the returned future aborts the cycle. It is safe to do so
    /// while holding a `watch::Ref` from [`Huddle::subscribe`].
    pub async fn submit(&self, text: &str) -> Result<CycleOutcome, SubmitError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SubmitError::EmptyMessage);
        }

        let guard = self.begin()?;
        let cycle = guard.cycle;
        self.store.emit(PlaybackEvent::UserSubmitted {
            cycle,
            text: text.to_string(),
        })?;
        tracing::info!(%cycle, chars = text.len(), "Submission accepted");

        let outcome = self.run_cycle(cycle, self.backend.chat(text)).await;
        drop(guard);
        outcome
    }

    /// Play the backend's greeting conversation
    pub async fn greet(&self) -> Result<CycleOutcome, SubmitError> {
        let guard = self.begin()?;
        let cycle = guard.cycle;
        self.store.emit(PlaybackEvent::GreetingRequested { cycle })?;
        tracing::info!(%cycle, "Greeting requested");

        let outcome = self.run_cycle(cycle, self.backend.welcome()).await;
        drop(guard);
        outcome
    }

    fn begin(&self) -> Result<CycleGuard<'_>, SubmitError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Submission rejected, a cycle is in flight");
            return Err(SubmitError::Busy);
        }
        Ok(CycleGuard {
            store: &self.store,
            in_flight: &self.in_flight,
            cycle: CycleId::new(),
        })
    }

    async fn run_cycle<F>(&self, cycle: CycleId, fetch: F) -> Result<CycleOutcome, SubmitError>
    where
        F: Future<Output = Result<Value, BackendError>>,
    {
        let fetched = match tokio::time::timeout(self.request_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(self.request_timeout)),
        };
        let response = fetched
            .and_then(|body| ConversationResponse::from_value(&body).map_err(BackendError::from));

        match response {
            Ok(response) => {
                let turns = normalize_all(&response.conversation);
                let report = self.scheduler.play(cycle, &turns, self.store.as_ref()).await?;
                Ok(CycleOutcome::Played(report))
            }
            Err(error) => {
                tracing::warn!(
                    %cycle,
                    backend = self.backend.name(),
                    error = %error,
                    "Backend failed, showing fallback"
                );
                self.store.emit(PlaybackEvent::FallbackShown {
                    cycle,
                    reason: error.to_string(),
                })?;
                Ok(CycleOutcome::Fallback(error))
            }
        }
    }
}
