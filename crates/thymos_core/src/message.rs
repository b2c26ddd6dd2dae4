//! Message adapters: pull `(role, content, timestamp)` out of whatever shape the
//! host hands us.
//!
//! Hosts deliver sessions in several formats. Each adapter understands one of
//! them; `parse_messages` tries them in priority order and the first one that
//! recognises the input wins. Anything unrecognised yields no messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Conversational role an entry was classified for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Lenient role parsing. Hosts use a handful of synonyms for the agent side.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "user" | "human" => Some(Role::User),
            "assistant" | "agent" | "ai" | "model" => Some(Role::Assistant),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single chat message after adaptation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    role: Role,
    content: String,
    timestamp: Option<String>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>, timestamp: Option<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    /// Build from a JSON object carrying `role` and `content`.
    /// Returns `None` when either is missing or the role is unknown.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let role = Role::parse(obj.get("role")?.as_str()?)?;
        let content = content_text(obj.get("content")?)?;
        let timestamp = obj
            .get("timestamp")
            .or_else(|| obj.get("created_at"))
            .and_then(timestamp_text);
        Some(Self::new(role, content, timestamp))
    }
}

/// Flatten message content. Strings pass through; arrays of parts keep only
/// text parts, joined by newlines.
fn content_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => {
            let texts: Vec<&str> = parts
                .iter()
                .filter_map(|part| match part {
                    Value::String(s) => Some(s.as_str()),
                    Value::Object(obj) => {
                        let is_text = obj
                            .get("type")
                            .and_then(Value::as_str)
                            .map_or(true, |t| t == "text");
                        if is_text {
                            obj.get("text").and_then(Value::as_str)
                        } else {
                            None
                        }
                    }
                    _ => None,
                })
                .collect();
            if texts.is_empty() {
                None
            } else {
                Some(texts.join("\n"))
            }
        }
        _ => None,
    }
}

fn timestamp_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One recognised input shape.
pub trait MessageAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` means "not my format"; `Some(vec![])` means recognised but empty.
    fn parse(&self, raw: &str) -> Option<Vec<ChatMessage>>;
}

/// `{"messages": [...]}` or `{"session": {"messages": [...]}}`.
pub struct ContainerAdapter;

impl ContainerAdapter {
    pub fn from_value(value: &Value) -> Option<Vec<ChatMessage>> {
        let list = value
            .get("messages")
            .or_else(|| value.get("session").and_then(|s| s.get("messages")))?
            .as_array()?;
        Some(list.iter().filter_map(message_or_event).collect())
    }
}

impl MessageAdapter for ContainerAdapter {
    fn name(&self) -> &'static str {
        "container"
    }

    fn parse(&self, raw: &str) -> Option<Vec<ChatMessage>> {
        let value: Value = serde_json::from_str(raw.trim()).ok()?;
        Self::from_value(&value)
    }
}

/// Line-delimited JSON session logs. Each line is a message, or an event
/// wrapping one under `message`. Lines that are neither are skipped.
pub struct EventLogAdapter;

impl MessageAdapter for EventLogAdapter {
    fn name(&self) -> &'static str {
        "event-log"
    }

    fn parse(&self, raw: &str) -> Option<Vec<ChatMessage>> {
        let mut parsed_any = false;
        let mut out = Vec::new();
        for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Ok(value) = serde_json::from_str::<Value>(line) else {
                continue;
            };
            if !value.is_object() {
                continue;
            }
            parsed_any = true;
            if let Some(msg) = message_or_event(&value) {
                out.push(msg);
            }
        }
        // A single JSON document is not an event log; leave it to the raw adapter.
        if !parsed_any || (out.len() <= 1 && raw.trim().lines().count() <= 1) {
            return None;
        }
        Some(out)
    }
}

/// A single `{"role": ..., "content": ...}` object, bare or wrapped in an
/// event under `message` (a one-line session log).
pub struct RawObjectAdapter;

impl MessageAdapter for RawObjectAdapter {
    fn name(&self) -> &'static str {
        "raw-object"
    }

    fn parse(&self, raw: &str) -> Option<Vec<ChatMessage>> {
        let value: Value = serde_json::from_str(raw.trim()).ok()?;
        message_or_event(&value).map(|m| vec![m])
    }
}

fn message_or_event(value: &Value) -> Option<ChatMessage> {
    if let Some(inner) = value.get("message") {
        let mut msg = ChatMessage::from_value(inner)?;
        if msg.timestamp.is_none() {
            msg.timestamp = value.get("timestamp").and_then(timestamp_text);
        }
        return Some(msg);
    }
    ChatMessage::from_value(value)
}

/// Adapters in the order they are tried.
pub fn default_adapters() -> Vec<Box<dyn MessageAdapter>> {
    vec![
        Box::new(ContainerAdapter),
        Box::new(EventLogAdapter),
        Box::new(RawObjectAdapter),
    ]
}

/// Run the adapter chain over `raw`. Unknown formats produce an empty list.
pub fn parse_messages(raw: &str) -> Vec<ChatMessage> {
    for adapter in default_adapters() {
        if let Some(messages) = adapter.parse(raw) {
            tracing::debug!(
                "Parsed {} messages with the {} adapter",
                messages.len(),
                adapter.name()
            );
            return messages;
        }
    }
    tracing::debug!("No message adapter recognised the input");
    Vec::new()
}

/// The most recent message for `role` with non-blank content.
pub fn latest_for_role(messages: &[ChatMessage], role: Role) -> Option<&ChatMessage> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == role && !m.content.trim().is_empty())
}
