//! Conversation Responses
//!
//! Decoding of the backend's batch payload: `{ "conversation": [Turn, ...] }`.
//!
//! Bodies are produced by language models upstream, so decoding tolerates
//! markdown code fences and prose around the JSON object. Turns themselves
//! are read leniently; only a missing or non-list `conversation` is an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::payload::lenient;

/// Response received but not usable
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// Body is not JSON, even after clean-up
    #[error("response is not JSON: {0}")]
    NotJson(String),

    /// No `conversation` key
    #[error("response has no conversation")]
    MissingConversation,

    /// `conversation` is present but not a list
    #[error("conversation is not a list")]
    ConversationNotList,
}

/// One raw agent contribution
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Turn {
    /// Agent name, e.g. `"Mike"`
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    /// Agent role as the backend describes it
    #[serde(deserialize_with = "lenient::string")]
    pub role: String,
    /// Agent emoji as the backend sends it
    #[serde(deserialize_with = "lenient::string")]
    pub emoji: String,
    /// Workflow stage of the turn (`"initial_search"`, `"summary"`, ...)
    #[serde(rename = "type", deserialize_with = "lenient::string")]
    pub kind: String,
    /// Message text, or a structured message object
    pub message: MessageBody,
    /// Optional structured payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Backend timestamp, kept as sent
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::text")]
    pub timestamp: Option<String>,
}

impl Turn {
    /// A plain text turn
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: MessageBody::Text(message.into()),
            ..Self::default()
        }
    }

    /// Attach a structured payload
    #[must_use]
    pub fn with_output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }
}

/// The `message` field of a turn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum MessageBody {
    /// Plain text
    Text(String),
    /// Structured object (or list) with its text nested inside
    Structured(Value),
}

impl Default for MessageBody {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<Value> for MessageBody {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s),
            Value::Null => Self::default(),
            Value::Bool(b) => Self::Text(b.to_string()),
            Value::Number(n) => Self::Text(n.to_string()),
            other @ (Value::Object(_) | Value::Array(_)) => Self::Structured(other),
        }
    }
}

impl From<MessageBody> for Value {
    fn from(body: MessageBody) -> Self {
        match body {
            MessageBody::Text(s) => Value::String(s),
            MessageBody::Structured(v) => v,
        }
    }
}

/// A decoded batch response
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConversationResponse {
    /// Turns in backend order
    pub conversation: Vec<Turn>,
}

impl ConversationResponse {
    /// Extract the conversation from a decoded body
    ///
    /// List elements that are not objects are skipped.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        let conversation = value
            .get("conversation")
            .ok_or(SchemaError::MissingConversation)?;
        let Value::Array(items) = conversation else {
            return Err(SchemaError::ConversationNotList);
        };

        let turns: Vec<Turn> = items
            .iter()
            .filter(|item| item.is_object())
            .filter_map(|item| Turn::deserialize(item).ok())
            .collect();

        if turns.len() < items.len() {
            tracing::debug!(
                skipped = items.len() - turns.len(),
                "Skipped unreadable conversation entries"
            );
        }

        Ok(Self {
            conversation: turns,
        })
    }

    /// Decode a raw body straight into a conversation
    pub fn from_body(body: &str) -> Result<Self, SchemaError> {
        Self::from_value(&decode_body(body)?)
    }
}

/// Decode a raw response body into JSON
///
/// Tries the body as-is, then with markdown fences stripped, then the span
/// between the first `{` and the last `}`.
pub fn decode_body(body: &str) -> Result<Value, SchemaError> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Ok(value);
    }

    let cleaned = strip_fences(body);
    let first_error = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if end > start {
            if let Ok(value) = serde_json::from_str::<Value>(&cleaned[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(SchemaError::NotJson(first_error.to_string()))
}

fn strip_fences(body: &str) -> String {
    body.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_turn_wire_names() {
        let turn: Turn = serde_json::from_value(json!({
            "name": "Mike",
            "role": "Residential Property Specialist",
            "emoji": "🏠",
            "type": "initial_search",
            "message": "Found some options",
            "output": {"initial_search": {}},
            "timestamp": "2024-01-01T10:00:00"
        }))
        .unwrap();

        assert_eq!(turn.name, "Mike");
        assert_eq!(turn.kind, "initial_search");
        assert_eq!(turn.message, MessageBody::Text("Found some options".into()));
        assert!(turn.output.is_some());
        assert_eq!(turn.timestamp.as_deref(), Some("2024-01-01T10:00:00"));
    }

    #[test]
    fn test_turn_is_lenient() {
        let turn: Turn = serde_json::from_value(json!({
            "name": 42,
            "role": null,
            "message": {"message": "nested"}
        }))
        .unwrap();
        assert_eq!(turn.name, "42");
        assert_eq!(turn.role, "");
        assert!(matches!(turn.message, MessageBody::Structured(_)));
        assert_eq!(turn.output, None);
    }

    #[test]
    fn test_schema_errors() {
        assert_eq!(
            ConversationResponse::from_value(&json!({})),
            Err(SchemaError::MissingConversation)
        );
        assert_eq!(
            ConversationResponse::from_value(&json!({"conversation": "nope"})),
            Err(SchemaError::ConversationNotList)
        );
        assert_eq!(
            ConversationResponse::from_value(&json!({"conversation": []}))
                .unwrap()
                .conversation
                .len(),
            0
        );
    }

    #[test]
    fn test_non_object_entries_are_skipped() {
        let response = ConversationResponse::from_value(&json!({
            "conversation": [{"name": "Sarah", "message": "Hi"}, "stray", 7]
        }))
        .unwrap();
        assert_eq!(response.conversation, vec![Turn::new("Sarah", "Hi")]);
    }

    #[test]
    fn test_decode_fenced_body() {
        let body = "```json\n{\"conversation\": []}\n```";
        assert_eq!(decode_body(body).unwrap(), json!({"conversation": []}));
    }

    #[test]
    fn test_decode_body_with_prose() {
        let body = "Here you go: {\"conversation\": [{\"name\": \"Jack\"}]} Hope that helps!";
        let response = ConversationResponse::from_body(body).unwrap();
        assert_eq!(response.conversation[0].name, "Jack");
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_body("<html>502 Bad Gateway</html>"),
            Err(SchemaError::NotJson(_))
        ));
        assert!(matches!(decode_body(""), Err(SchemaError::NotJson(_))));
    }
}
