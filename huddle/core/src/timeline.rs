//! Timeline Reducer
//!
//! Owns the ordered list of [`DisplayMessage`]s and the [`PlaybackState`].
//! State only changes by applying a [`PlaybackEvent`]; events that would break
//! an invariant are rejected with a [`TimelineError`] and leave the timeline
//! untouched.
//!
//! # Invariants
//!
//! - Append-only, except that the placeholder is removed and the last agent
//!   message may be marked as a hand-off.
//! - At most one placeholder at any instant, and no content is revealed while
//!   one is showing.
//! - `sequence_index` is strictly increasing in append order.
//! - Messages accumulate across cycles; a new submission does not clear them.

use serde::Serialize;
use thiserror::Error;

use crate::events::PlaybackEvent;
use crate::messages::{
    CycleId, DisplayMessage, MessageDraft, MessageOrigin, PlaybackState, Transition,
};

/// Event rejected by the reducer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimelineError {
    /// A cycle is already running
    #[error("a response cycle is already in progress")]
    NotIdle,

    /// The event needs a running cycle
    #[error("no response cycle is in progress")]
    NotStreaming,

    /// The event belongs to a different cycle
    #[error("event for cycle {got} but cycle {expected} is running")]
    CycleMismatch {
        /// Cycle currently running
        expected: CycleId,
        /// Cycle named by the event
        got: CycleId,
    },

    /// A placeholder is already showing
    #[error("a placeholder is already showing")]
    PlaceholderActive,

    /// No placeholder to clear
    #[error("no placeholder is showing")]
    NoPlaceholder,

    /// Draft origin does not fit the event
    #[error("a {0:?} draft cannot be appended by this event")]
    WrongOrigin(MessageOrigin),

    /// No agent message to mark as a hand-off
    #[error("no agent message to mark")]
    NothingToMark,
}

/// Point-in-time copy of the timeline for renderers
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TimelineSnapshot {
    /// Current state
    pub state: PlaybackState,
    /// Running cycle, if any
    pub cycle: Option<CycleId>,
    /// Messages in sequence order
    pub messages: Vec<DisplayMessage>,
}

impl TimelineSnapshot {
    /// Number of placeholders showing (0 or 1)
    pub fn placeholder_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_placeholder()).count()
    }
}

/// Event-driven timeline state
#[derive(Debug, Default)]
pub struct Timeline {
    messages: Vec<DisplayMessage>,
    state: PlaybackState,
    cycle: Option<CycleId>,
    next_sequence: u64,
}

impl Timeline {
    /// Create an empty, idle timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Running cycle, if any
    pub fn current_cycle(&self) -> Option<CycleId> {
        self.cycle
    }

    /// Messages in sequence order
    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    /// True if a placeholder is showing
    pub fn has_placeholder(&self) -> bool {
        self.messages.iter().any(DisplayMessage::is_placeholder)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            state: self.state,
            cycle: self.cycle,
            messages: self.messages.clone(),
        }
    }

    /// Apply one event
    ///
    /// Returns the message appended by the event, if any.
    pub fn apply(&mut self, event: &PlaybackEvent) -> Result<Option<DisplayMessage>, TimelineError> {
        match event {
            PlaybackEvent::UserSubmitted { cycle, text } => {
                if self.state != PlaybackState::Idle {
                    return Err(TimelineError::NotIdle);
                }
                self.state = PlaybackState::Streaming;
                self.cycle = Some(*cycle);
                Ok(Some(self.append(MessageDraft::user(text.clone()))))
            }

            PlaybackEvent::GreetingRequested { cycle } => {
                if self.state != PlaybackState::Idle {
                    return Err(TimelineError::NotIdle);
                }
                self.state = PlaybackState::Streaming;
                self.cycle = Some(*cycle);
                Ok(None)
            }

            PlaybackEvent::ResponseReceived { cycle, .. } => {
                self.require_cycle(*cycle)?;
                Ok(None)
            }

            PlaybackEvent::PlaceholderShown { message } => {
                self.require_streaming()?;
                if message.origin != MessageOrigin::Placeholder {
                    return Err(TimelineError::WrongOrigin(message.origin));
                }
                if self.has_placeholder() {
                    return Err(TimelineError::PlaceholderActive);
                }
                Ok(Some(self.append(message.clone())))
            }

            PlaybackEvent::PlaceholderCleared => {
                self.require_streaming()?;
                if !self.has_placeholder() {
                    return Err(TimelineError::NoPlaceholder);
                }
                self.clear_placeholder();
                Ok(None)
            }

            PlaybackEvent::BlockRevealed { message } => {
                self.require_streaming()?;
                if message.origin != MessageOrigin::Agent {
                    return Err(TimelineError::WrongOrigin(message.origin));
                }
                if self.has_placeholder() {
                    return Err(TimelineError::PlaceholderActive);
                }
                Ok(Some(self.append(message.clone())))
            }

            PlaybackEvent::HandoffMarked { to } => {
                self.require_streaming()?;
                let last = self
                    .messages
                    .iter_mut()
                    .rev()
                    .find(|m| m.is_agent())
                    .ok_or(TimelineError::NothingToMark)?;
                last.transition = Transition::Handoff { to: to.clone() };
                Ok(None)
            }

            PlaybackEvent::StreamCompleted { cycle } => {
                self.require_cycle(*cycle)?;
                if self.has_placeholder() {
                    return Err(TimelineError::PlaceholderActive);
                }
                self.finish();
                Ok(None)
            }

            PlaybackEvent::StreamAborted { cycle } => {
                self.require_cycle(*cycle)?;
                self.clear_placeholder();
                self.finish();
                Ok(None)
            }

            PlaybackEvent::FallbackShown { cycle, .. } => {
                self.require_cycle(*cycle)?;
                self.clear_placeholder();
                let message = self.append(MessageDraft::fallback());
                self.finish();
                Ok(Some(message))
            }
        }
    }

    fn require_streaming(&self) -> Result<(), TimelineError> {
        if self.state == PlaybackState::Streaming {
            Ok(())
        } else {
            Err(TimelineError::NotStreaming)
        }
    }

    fn require_cycle(&self, cycle: CycleId) -> Result<(), TimelineError> {
        self.require_streaming()?;
        match self.cycle {
            Some(expected) if expected != cycle => Err(TimelineError::CycleMismatch {
                expected,
                got: cycle,
            }),
            _ => Ok(()),
        }
    }

    fn append(&mut self, draft: MessageDraft) -> DisplayMessage {
        let message = draft.into_message(self.next_sequence);
        self.next_sequence += 1;
        self.messages.push(message.clone());
        message
    }

    fn clear_placeholder(&mut self) {
        self.messages.retain(|m| !m.is_placeholder());
    }

    fn finish(&mut self) {
        self.state = PlaybackState::Idle;
        self.cycle = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{MessageTag, FALLBACK_TEXT};
    use crate::normalizer::normalize;
    use crate::response::Turn;
    use pretty_assertions::assert_eq;

    fn started() -> (Timeline, CycleId) {
        let mut timeline = Timeline::new();
        let cycle = CycleId::new();
        timeline
            .apply(&PlaybackEvent::UserSubmitted {
                cycle,
                text: "Find me a house".into(),
            })
            .unwrap();
        (timeline, cycle)
    }

    fn mike() -> crate::normalizer::NormalizedTurn {
        normalize(&Turn::new("Mike", "Found some options"))
    }

    #[test]
    fn test_submission_starts_cycle() {
        let (timeline, cycle) = started();
        assert_eq!(timeline.state(), PlaybackState::Streaming);
        assert_eq!(timeline.current_cycle(), Some(cycle));
        assert_eq!(timeline.messages().len(), 1);
        assert_eq!(timeline.messages()[0].origin, MessageOrigin::User);
    }

    #[test]
    fn test_second_submission_rejected_while_streaming() {
        let (mut timeline, _) = started();
        let result = timeline.apply(&PlaybackEvent::UserSubmitted {
            cycle: CycleId::new(),
            text: "again".into(),
        });
        assert_eq!(result, Err(TimelineError::NotIdle));
        assert_eq!(timeline.messages().len(), 1);
    }

    #[test]
    fn test_single_placeholder() {
        let (mut timeline, _) = started();
        let placeholder = PlaybackEvent::PlaceholderShown {
            message: MessageDraft::placeholder(&mike()),
        };
        timeline.apply(&placeholder).unwrap();
        assert_eq!(timeline.apply(&placeholder), Err(TimelineError::PlaceholderActive));

        let reveal = PlaybackEvent::BlockRevealed {
            message: MessageDraft::agent_text(&mike(), "Found some options"),
        };
        assert_eq!(timeline.apply(&reveal), Err(TimelineError::PlaceholderActive));

        timeline.apply(&PlaybackEvent::PlaceholderCleared).unwrap();
        assert!(!timeline.has_placeholder());
        assert_eq!(
            timeline.apply(&PlaybackEvent::PlaceholderCleared),
            Err(TimelineError::NoPlaceholder)
        );
        timeline.apply(&reveal).unwrap();
    }

    #[test]
    fn test_sequence_indices_strictly_increase() {
        let (mut timeline, cycle) = started();
        for _ in 0..3 {
            timeline
                .apply(&PlaybackEvent::PlaceholderShown {
                    message: MessageDraft::placeholder(&mike()),
                })
                .unwrap();
            timeline.apply(&PlaybackEvent::PlaceholderCleared).unwrap();
            timeline
                .apply(&PlaybackEvent::BlockRevealed {
                    message: MessageDraft::agent_text(&mike(), "text"),
                })
                .unwrap();
        }
        timeline.apply(&PlaybackEvent::StreamCompleted { cycle }).unwrap();

        let indices: Vec<u64> = timeline.messages().iter().map(|m| m.sequence_index).collect();
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(timeline.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_handoff_marks_last_agent_message() {
        let (mut timeline, _) = started();
        assert_eq!(
            timeline.apply(&PlaybackEvent::HandoffMarked { to: "Jessica".into() }),
            Err(TimelineError::NothingToMark)
        );

        timeline
            .apply(&PlaybackEvent::BlockRevealed {
                message: MessageDraft::agent_text(&mike(), "one"),
            })
            .unwrap();
        timeline
            .apply(&PlaybackEvent::BlockRevealed {
                message: MessageDraft::agent_text(&mike(), "two"),
            })
            .unwrap();
        timeline
            .apply(&PlaybackEvent::HandoffMarked { to: "Jessica".into() })
            .unwrap();

        let messages = timeline.messages();
        assert_eq!(messages[1].transition, Transition::None);
        assert_eq!(
            messages[2].transition,
            Transition::Handoff { to: "Jessica".into() }
        );
    }

    #[test]
    fn test_completion_requires_cleared_placeholder() {
        let (mut timeline, cycle) = started();
        timeline
            .apply(&PlaybackEvent::PlaceholderShown {
                message: MessageDraft::placeholder(&mike()),
            })
            .unwrap();
        assert_eq!(
            timeline.apply(&PlaybackEvent::StreamCompleted { cycle }),
            Err(TimelineError::PlaceholderActive)
        );
    }

    #[test]
    fn test_abort_removes_placeholder() {
        let (mut timeline, cycle) = started();
        timeline
            .apply(&PlaybackEvent::PlaceholderShown {
                message: MessageDraft::placeholder(&mike()),
            })
            .unwrap();
        timeline.apply(&PlaybackEvent::StreamAborted { cycle }).unwrap();
        assert!(!timeline.has_placeholder());
        assert_eq!(timeline.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_fallback_ends_cycle() {
        let (mut timeline, cycle) = started();
        let appended = timeline
            .apply(&PlaybackEvent::FallbackShown {
                cycle,
                reason: "boom".into(),
            })
            .unwrap()
            .unwrap();
        assert_eq!(appended.tag, MessageTag::Error);
        assert_eq!(appended.text, FALLBACK_TEXT);
        assert_eq!(timeline.state(), PlaybackState::Idle);
        assert_eq!(
            timeline.apply(&PlaybackEvent::FallbackShown {
                cycle,
                reason: "again".into(),
            }),
            Err(TimelineError::NotStreaming)
        );
    }

    #[test]
    fn test_events_from_other_cycles_rejected() {
        let (mut timeline, cycle) = started();
        let other = CycleId::new();
        assert_eq!(
            timeline.apply(&PlaybackEvent::StreamCompleted { cycle: other }),
            Err(TimelineError::CycleMismatch {
                expected: cycle,
                got: other,
            })
        );
    }

    #[test]
    fn test_messages_accumulate_across_cycles() {
        let (mut timeline, cycle) = started();
        timeline.apply(&PlaybackEvent::StreamCompleted { cycle }).unwrap();
        timeline
            .apply(&PlaybackEvent::UserSubmitted {
                cycle: CycleId::new(),
                text: "next".into(),
            })
            .unwrap();
        assert_eq!(timeline.messages().len(), 2);
        assert_eq!(timeline.messages()[1].sequence_index, 1);
    }

    #[test]
    fn test_greeting_starts_cycle_without_message() {
        let mut timeline = Timeline::new();
        let cycle = CycleId::new();
        timeline
            .apply(&PlaybackEvent::GreetingRequested { cycle })
            .unwrap();
        assert_eq!(timeline.state(), PlaybackState::Streaming);
        assert!(timeline.messages().is_empty());
    }

    #[test]
    fn test_wrong_origin_rejected() {
        let (mut timeline, _) = started();
        let result = timeline.apply(&PlaybackEvent::BlockRevealed {
            message: MessageDraft::user("sneaky"),
        });
        assert_eq!(result, Err(TimelineError::WrongOrigin(MessageOrigin::User)));
    }
}
