//! Playback Events
//!
//! Discrete state changes of the timeline. The scheduler and the submission
//! path emit these; the [`Timeline`](crate::timeline::Timeline) reducer is the
//! only thing that turns them into state. Surfaces that prefer deltas over
//! snapshots can subscribe to them directly.

use serde::{Deserialize, Serialize};

use crate::messages::{CycleId, DisplayMessage, MessageDraft};

/// A timeline state change
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    // ============================================
    // Cycle boundaries
    // ============================================
    /// The user sent a message; a new cycle starts
    UserSubmitted {
        /// Cycle being started
        cycle: CycleId,
        /// The submitted text
        text: String,
    },

    /// A greeting was requested; a new cycle starts without a user message
    GreetingRequested {
        /// Cycle being started
        cycle: CycleId,
    },

    /// The backend answered with a usable conversation
    ResponseReceived {
        /// Cycle the response belongs to
        cycle: CycleId,
        /// Number of turns about to be played
        turns: usize,
    },

    /// All turns have been revealed
    StreamCompleted {
        /// Finished cycle
        cycle: CycleId,
    },

    /// The cycle was abandoned part-way (its submitter went away)
    StreamAborted {
        /// Abandoned cycle
        cycle: CycleId,
    },

    /// The cycle failed; the apology message replaces the reply
    FallbackShown {
        /// Failed cycle
        cycle: CycleId,
        /// What went wrong, for logs and diagnostics
        reason: String,
    },

    // ============================================
    // Reveal steps
    // ============================================
    /// An agent's "thinking" placeholder appears
    PlaceholderShown {
        /// Placeholder to append
        message: MessageDraft,
    },

    /// The current placeholder goes away
    PlaceholderCleared,

    /// One piece of an agent's reply appears
    BlockRevealed {
        /// Message to append
        message: MessageDraft,
    },

    /// The most recent agent message hands off to another agent
    HandoffMarked {
        /// Agent taking over
        to: String,
    },
}

impl PlaybackEvent {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserSubmitted { .. } => "user_submitted",
            Self::GreetingRequested { .. } => "greeting_requested",
            Self::ResponseReceived { .. } => "response_received",
            Self::StreamCompleted { .. } => "stream_completed",
            Self::StreamAborted { .. } => "stream_aborted",
            Self::FallbackShown { .. } => "fallback_shown",
            Self::PlaceholderShown { .. } => "placeholder_shown",
            Self::PlaceholderCleared => "placeholder_cleared",
            Self::BlockRevealed { .. } => "block_revealed",
            Self::HandoffMarked { .. } => "handoff_marked",
        }
    }
}

/// Change published after an event has been applied
///
/// Carries the appended message, stamped with its id and sequence index, so
/// delta subscribers see exactly what snapshot subscribers see.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineUpdate {
    /// The event as applied
    pub event: PlaybackEvent,
    /// Message appended by the event, if any
    pub appended: Option<DisplayMessage>,
}
