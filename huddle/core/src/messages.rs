//! Display Messages
//!
//! Timeline entries as renderers see them. A [`DisplayMessage`] is either the
//! user's own text, a transient "thinking" placeholder, or one piece of an
//! agent's reply (its text or one content block).
//!
//! Messages are built from a [`MessageDraft`]; the timeline assigns the id,
//! sequence index and timestamp when the draft is appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blocks::ContentBlock;
use crate::normalizer::NormalizedTurn;
use crate::persona::Persona;

/// Text of the message shown when a cycle fails
pub const FALLBACK_TEXT: &str = "Sorry, I encountered an error. Please try again.";

/// Unique message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one submission/response cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(pub uuid::Uuid);

impl CycleId {
    /// Generate a new random cycle ID
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who a message came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageOrigin {
    /// The human asking questions
    User,
    /// An advisor
    Agent,
    /// "Thinking" indicator standing in for an agent
    Placeholder,
}

/// How the conversation moves on after a message
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "lowercase")]
pub enum Transition {
    /// Same agent continues, or the cycle ends
    #[default]
    None,
    /// The next turn belongs to a different agent
    Handoff {
        /// Agent taking over
        to: String,
    },
}

impl Transition {
    /// True for [`Transition::Handoff`]
    pub fn is_handoff(&self) -> bool {
        matches!(self, Self::Handoff { .. })
    }
}

/// Presentation tag
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageTag {
    /// Regular message
    #[default]
    None,
    /// Error notice
    Error,
}

/// One timeline entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplayMessage {
    /// Unique ID
    pub id: MessageId,
    /// Who it came from
    pub origin: MessageOrigin,
    /// Agent name (absent for user messages)
    pub agent_name: Option<String>,
    /// Agent emoji
    pub emoji: Option<String>,
    /// Agent role
    pub role: Option<String>,
    /// Workflow stage of the turn this message belongs to
    pub turn_kind: Option<String>,
    /// Text (empty for block messages)
    pub text: String,
    /// Structured content
    pub blocks: Vec<ContentBlock>,
    /// Hand-off marker
    pub transition: Transition,
    /// Presentation tag
    pub tag: MessageTag,
    /// Arrival order, strictly increasing
    pub sequence_index: u64,
    /// When the message was appended
    pub created_at: DateTime<Utc>,
}

impl DisplayMessage {
    /// True for placeholders
    pub fn is_placeholder(&self) -> bool {
        self.origin == MessageOrigin::Placeholder
    }

    /// True for agent messages
    pub fn is_agent(&self) -> bool {
        self.origin == MessageOrigin::Agent
    }
}

/// A message waiting to be appended
///
/// Fields mirror [`DisplayMessage`] minus what the timeline assigns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    /// Who the message is from
    pub origin: MessageOrigin,
    /// Agent name, for agent messages
    pub agent_name: Option<String>,
    /// Agent emoji
    pub emoji: Option<String>,
    /// Agent role
    pub role: Option<String>,
    /// Workflow stage of the source turn
    pub turn_kind: Option<String>,
    /// Display text
    pub text: String,
    /// Structured content
    pub blocks: Vec<ContentBlock>,
    /// Display hint
    pub tag: MessageTag,
}

impl MessageDraft {
    /// The user's submission
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            origin: MessageOrigin::User,
            agent_name: None,
            emoji: None,
            role: None,
            turn_kind: None,
            text: text.into(),
            blocks: Vec::new(),
            tag: MessageTag::None,
        }
    }

    /// "<name> is thinking..." for the given turn
    pub fn placeholder(turn: &NormalizedTurn) -> Self {
        Self {
            origin: MessageOrigin::Placeholder,
            text: format!("{} is thinking...", turn.agent_name),
            ..Self::agent_base(turn)
        }
    }

    /// The turn's text
    pub fn agent_text(turn: &NormalizedTurn, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::agent_base(turn)
        }
    }

    /// One of the turn's blocks
    pub fn agent_block(turn: &NormalizedTurn, block: ContentBlock) -> Self {
        Self {
            blocks: vec![block],
            ..Self::agent_base(turn)
        }
    }

    /// The apology shown when a cycle fails
    pub fn fallback() -> Self {
        let persona = Persona::DEFAULT;
        let profile = persona.profile();
        Self {
            origin: MessageOrigin::Agent,
            agent_name: Some(persona.name().to_string()),
            emoji: Some(profile.emoji.to_string()),
            role: Some(profile.role.to_string()),
            turn_kind: None,
            text: FALLBACK_TEXT.to_string(),
            blocks: Vec::new(),
            tag: MessageTag::Error,
        }
    }

    fn agent_base(turn: &NormalizedTurn) -> Self {
        Self {
            origin: MessageOrigin::Agent,
            agent_name: Some(turn.agent_name.clone()),
            emoji: Some(turn.emoji.clone()),
            role: Some(turn.role.clone()),
            turn_kind: Some(turn.turn_kind.clone()).filter(|k| !k.is_empty()),
            text: String::new(),
            blocks: Vec::new(),
            tag: MessageTag::None,
        }
    }

    /// Stamp the draft with identity and ordering
    pub(crate) fn into_message(self, sequence_index: u64) -> DisplayMessage {
        DisplayMessage {
            id: MessageId::new(),
            origin: self.origin,
            agent_name: self.agent_name,
            emoji: self.emoji,
            role: self.role,
            turn_kind: self.turn_kind,
            text: self.text,
            blocks: self.blocks,
            transition: Transition::None,
            tag: self.tag,
            sequence_index,
            created_at: Utc::now(),
        }
    }
}

/// Playback state machine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Waiting for a submission
    #[default]
    Idle,
    /// A cycle is in flight (fetching or revealing)
    Streaming,
}
