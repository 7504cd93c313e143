//! Turn Normalizer
//!
//! Pure mapping from one raw [`Turn`] to display text plus zero or more
//! [`ContentBlock`]s. Normalization is total: malformed payloads degrade to
//! text, they never fail.
//!
//! # Rules
//!
//! 1. An absent or empty payload (`null`, `{}`, `[]`, `""`) yields the message
//!    text and no blocks.
//! 2. A known persona's payload goes through the [`dispatcher`](crate::dispatcher).
//! 3. If the payload holds none of the persona's known keys, it is rendered
//!    as a single `text` block and the turn records an [`ExtractionGap`].
//!    A known key with nothing usable under it yields no blocks.
//!
//! A text block that repeats the turn's message is dropped.
//!
//! Payloads from agents outside the team are dropped; their text still shows.

use serde::Serialize;
use serde_json::Value;

use crate::blocks::ContentBlock;
use crate::dispatcher;
use crate::payload::is_empty_payload;
use crate::persona::{identity_key, profile_for, Persona};
use crate::response::{MessageBody, Turn};

/// Keys searched, in order, for the text of a structured message
pub const MESSAGE_STAGE_KEYS: [&str; 8] = [
    "initial_search",
    "analysis",
    "strategy",
    "final_recommendations",
    "summary",
    "introduction",
    "overview",
    "lifestyle_profile",
];

/// A recognized persona's payload matched none of its known keys
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExtractionGap {
    /// Persona whose rules found nothing
    pub persona: Persona,
    /// Agent name as sent
    pub agent_name: String,
}

/// A turn ready for playback
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NormalizedTurn {
    /// Agent name as sent
    pub agent_name: String,
    /// Agent role, from the turn or the persona registry
    pub role: String,
    /// Agent emoji, from the turn or the persona registry
    pub emoji: String,
    /// Workflow stage (`type` on the wire)
    pub turn_kind: String,
    /// Display text
    pub text: String,
    /// Structured content, in display order
    pub blocks: Vec<ContentBlock>,
    /// Set when the payload was rendered as raw text
    pub gap: Option<ExtractionGap>,
}

/// One thing the scheduler reveals as its own message
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// The turn's text
    Text(String),
    /// One content block
    Block(ContentBlock),
}

impl NormalizedTurn {
    /// Identity used to detect agent switches
    pub fn identity(&self) -> String {
        identity_key(&self.agent_name)
    }

    /// Segments in reveal order
    ///
    /// The text comes first unless it is empty and blocks follow. There is
    /// always at least one segment.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = Vec::with_capacity(self.blocks.len() + 1);
        if !self.text.is_empty() || self.blocks.is_empty() {
            segments.push(Segment::Text(self.text.clone()));
        }
        segments.extend(self.blocks.iter().cloned().map(Segment::Block));
        segments
    }
}

/// Normalize one turn
pub fn normalize(turn: &Turn) -> NormalizedTurn {
    let profile = profile_for(&turn.name);
    let text = message_text(&turn.message);
    let (mut blocks, gap) = extract_blocks(turn);
    // A summary narrative usually repeats the turn's own message
    if !text.trim().is_empty() {
        blocks.retain(|block| !matches!(block.as_text(), Some(t) if t.trim() == text.trim()));
    }

    NormalizedTurn {
        agent_name: turn.name.clone(),
        role: or_default(&turn.role, profile.role),
        emoji: or_default(&turn.emoji, profile.emoji),
        turn_kind: turn.kind.clone(),
        text,
        blocks,
        gap,
    }
}

/// Normalize a whole conversation, preserving order
pub fn normalize_all(turns: &[Turn]) -> Vec<NormalizedTurn> {
    turns.iter().map(normalize).collect()
}

fn extract_blocks(turn: &Turn) -> (Vec<ContentBlock>, Option<ExtractionGap>) {
    let Some(payload) = turn.output.as_ref().filter(|p| !is_empty_payload(p)) else {
        return (Vec::new(), None);
    };

    let Some(persona) = Persona::from_name(&turn.name) else {
        tracing::debug!(agent = %turn.name, "Ignoring payload from unknown agent");
        return (Vec::new(), None);
    };

    if dispatcher::has_known_key(persona, payload) {
        return (dispatcher::dispatch_persona(persona, payload), None);
    }

    tracing::debug!(
        agent = %turn.name,
        persona = %persona,
        "Payload matched no known keys, rendering as text"
    );
    let gap = ExtractionGap {
        persona,
        agent_name: turn.name.clone(),
    };
    (vec![ContentBlock::Text(safe_string(payload))], Some(gap))
}

/// Display text of a message
///
/// Structured messages (and strings holding a JSON object) yield their own
/// `message`, else the first stage `message` in [`MESSAGE_STAGE_KEYS`] order,
/// else their JSON form.
pub fn message_text(body: &MessageBody) -> String {
    match body {
        MessageBody::Text(text) => {
            let trimmed = text.trim();
            if trimmed.starts_with('{') {
                if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
                    return structured_text(&value);
                }
            }
            text.clone()
        }
        MessageBody::Structured(value) => structured_text(value),
    }
}

fn structured_text(value: &Value) -> String {
    if let Some(text) = value.get("message").and_then(Value::as_str) {
        return text.to_string();
    }
    MESSAGE_STAGE_KEYS
        .iter()
        .find_map(|key| {
            value
                .get(key)
                .and_then(|stage| stage.get("message"))
                .and_then(Value::as_str)
        })
        .map_or_else(|| safe_string(value), str::to_string)
}

/// Render any JSON value as display text
///
/// Strings come out unquoted; everything else as pretty-printed JSON.
pub fn safe_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn or_default(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
