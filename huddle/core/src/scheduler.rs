//! Playback Scheduler
//!
//! Cooperative sequencer that reveals normalized turns as a live
//! conversation. For each turn it shows a "thinking" placeholder, waits a
//! jittered typing dwell, clears the placeholder and reveals the turn's text
//! and blocks one message at a time. When the next turn belongs to a
//! different agent, the last revealed message is marked as a hand-off and
//! the scheduler pauses before continuing.
//!
//! The scheduler never touches the timeline directly; it emits
//! [`PlaybackEvent`]s into an [`EventSink`]. All waiting goes through the
//! [`Clock`].

use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::clock::Clock;
use crate::events::PlaybackEvent;
use crate::messages::{CycleId, MessageDraft};
use crate::normalizer::{NormalizedTurn, Segment};
use crate::timeline::TimelineError;

/// Receives playback events in order
pub trait EventSink: Send + Sync {
    /// Apply an event; a rejected event stops playback
    fn emit(&self, event: PlaybackEvent) -> Result<(), TimelineError>;
}

/// Dwell intervals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackConfig {
    /// Shortest typing dwell
    pub typing_min: Duration,
    /// Longest typing dwell
    pub typing_max: Duration,
    /// Pause between messages of the same turn
    pub inter_block: Duration,
    /// Pause after a hand-off
    pub handoff: Duration,
    /// Jitter seed; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            typing_min: Duration::from_millis(500),
            typing_max: Duration::from_millis(1500),
            inter_block: Duration::from_millis(800),
            handoff: Duration::from_millis(1000),
            seed: None,
        }
    }
}

/// What a completed playback revealed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackReport {
    /// Turns played
    pub turns: usize,
    /// Agent messages appended (placeholders excluded)
    pub messages_revealed: usize,
    /// Hand-offs marked
    pub handoffs: usize,
}

/// Sequencer for one conversation at a time
pub struct PlaybackScheduler<C: Clock> {
    config: PlaybackConfig,
    clock: C,
    rng: Mutex<StdRng>,
}

impl<C: Clock> PlaybackScheduler<C> {
    /// Create a scheduler
    pub fn new(config: PlaybackConfig, clock: C) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            clock,
            rng: Mutex::new(rng),
        }
    }

    /// Dwell configuration
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// The clock used for dwells
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Draw the next typing dwell from the configured window
    pub fn typing_dwell(&self) -> Duration {
        let min = self.config.typing_min.as_millis();
        let max = self.config.typing_max.as_millis();
        if max <= min {
            return self.config.typing_min;
        }
        let millis = self.rng.lock().gen_range(min..=max);
        Duration::from_millis(saturating_u64(millis))
    }

    /// Reveal `turns` as cycle `cycle`
    ///
    /// Emits `ResponseReceived` first and `StreamCompleted` last. Stops at the
    /// first event the sink rejects.
    pub async fn play<S>(
        &self,
        cycle: CycleId,
        turns: &[NormalizedTurn],
        sink: &S,
    ) -> Result<PlaybackReport, TimelineError>
    where
        S: EventSink + ?Sized,
    {
        tracing::info!(%cycle, turns = turns.len(), "Playback started");
        sink.emit(PlaybackEvent::ResponseReceived {
            cycle,
            turns: turns.len(),
        })?;

        let mut report = PlaybackReport {
            turns: turns.len(),
            ..PlaybackReport::default()
        };
        let mut previous: Option<String> = None;

        for turn in turns {
            let identity = turn.identity();
            if previous.as_ref().is_some_and(|p| *p != identity) {
                tracing::debug!(%cycle, to = %turn.agent_name, "Hand-off");
                sink.emit(PlaybackEvent::HandoffMarked {
                    to: turn.agent_name.clone(),
                })?;
                report.handoffs += 1;
                self.clock.dwell(self.config.handoff).await;
            }

            sink.emit(PlaybackEvent::PlaceholderShown {
                message: MessageDraft::placeholder(turn),
            })?;
            let typing = self.typing_dwell();
            tracing::debug!(
                %cycle,
                agent = %turn.agent_name,
                dwell_ms = whole_millis(typing),
                "Agent typing"
            );
            self.clock.dwell(typing).await;
            sink.emit(PlaybackEvent::PlaceholderCleared)?;

            for (index, segment) in turn.segments().into_iter().enumerate() {
                if index > 0 {
                    self.clock.dwell(self.config.inter_block).await;
                }
                let message = match segment {
                    Segment::Text(text) => MessageDraft::agent_text(turn, text),
                    Segment::Block(block) => MessageDraft::agent_block(turn, block),
                };
                sink.emit(PlaybackEvent::BlockRevealed { message })?;
                report.messages_revealed += 1;
            }

            previous = Some(identity);
        }

        sink.emit(PlaybackEvent::StreamCompleted { cycle })?;
        tracing::info!(
            %cycle,
            messages = report.messages_revealed,
            handoffs = report.handoffs,
            "Playback completed"
        );
        Ok(report)
    }
}

/// Milliseconds in `duration`, saturating at `u64::MAX`
fn whole_millis(duration: Duration) -> u64 {
    saturating_u64(duration.as_millis())
}

fn saturating_u64(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
