//! Emotion entries, buckets and the per-scope state document.
//!
//! Entries are immutable once built. Everything the classifier hands back goes
//! through `EmotionEntry::from_raw`, which clamps the label to the configured
//! set, the intensity to low/medium/high, shapes the reason into a clause and
//! applies the confidence floor as a hard override.

use crate::config::EmotionConfig;
use crate::message::Role;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub const NEUTRAL_LABEL: &str = "neutral";
pub const UNSURE_REASON: &str = "unsure";
pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Intensity {
    #[default]
    Low,
    Medium,
    High,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Medium => "medium",
            Intensity::High => "high",
        }
    }
}

impl From<String> for Intensity {
    fn from(raw: String) -> Self {
        normalize_intensity(Some(&Value::String(raw)))
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw classifier output before normalization. Every field is optional and
/// loosely typed; nothing here is trusted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawClassification {
    #[serde(default)]
    pub label: Option<Value>,
    #[serde(default)]
    pub intensity: Option<Value>,
    #[serde(default)]
    pub reason: Option<Value>,
    #[serde(default)]
    pub confidence: Option<Value>,
}

impl RawClassification {
    pub fn new(label: &str, intensity: &str, reason: &str, confidence: f64) -> Self {
        Self {
            label: Some(Value::from(label)),
            intensity: Some(Value::from(intensity)),
            reason: Some(Value::from(reason)),
            confidence: Some(Value::from(confidence)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionEntry {
    /// ISO-8601 creation instant. Kept as text; see `parsed_timestamp`.
    pub timestamp: String,
    pub label: String,
    pub intensity: Intensity,
    pub reason: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_role: Option<Role>,
}

impl EmotionEntry {
    /// Normalize a classifier result into a stored entry.
    pub fn from_raw(
        raw: &RawClassification,
        role: Role,
        source_hash: Option<String>,
        config: &EmotionConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let confidence = normalize_confidence(raw.confidence.as_ref());
        let (label, intensity, reason) = if confidence < config.confidence_min {
            tracing::debug!(
                "Confidence {:.2} below floor {:.2}, storing neutral",
                confidence,
                config.confidence_min
            );
            (
                NEUTRAL_LABEL.to_string(),
                Intensity::Low,
                UNSURE_REASON.to_string(),
            )
        } else {
            (
                normalize_label(raw.label.as_ref(), config),
                normalize_intensity(raw.intensity.as_ref()),
                normalize_reason(raw.reason.as_ref(), config.max_reason_chars),
            )
        };

        Self {
            timestamp: format_instant(now),
            label,
            intensity,
            reason,
            confidence,
            source_hash,
            source_role: Some(role),
        }
    }

    /// Placeholder stored when classification fails.
    pub fn fallback(role: Role, source_hash: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            timestamp: format_instant(now),
            label: NEUTRAL_LABEL.to_string(),
            intensity: Intensity::Low,
            reason: UNSURE_REASON.to_string(),
            confidence: 0.0,
            source_hash,
            source_role: Some(role),
        }
    }

    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

pub fn format_instant(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Latest entry plus bounded history, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    #[serde(default)]
    pub latest: Option<EmotionEntry>,
    #[serde(default)]
    pub history: Vec<EmotionEntry>,
}

impl Bucket {
    /// Prepend `entry` and drop the oldest entries beyond `history_size`.
    pub fn push(&mut self, entry: EmotionEntry, history_size: usize) {
        self.history.insert(0, entry.clone());
        self.history.truncate(history_size.max(1));
        self.latest = Some(entry);
    }

    /// Restore `latest == history[0]` on documents written by older or foreign tools.
    pub fn repair(&mut self) {
        if let Some(head) = self.history.first() {
            if self.latest.as_ref() != Some(head) {
                self.latest = Some(head.clone());
            }
        }
    }

    pub fn latest_hash(&self) -> Option<&str> {
        self.latest.as_ref().and_then(|e| e.source_hash.as_deref())
    }

    pub fn recent(&self, n: usize) -> &[EmotionEntry] {
        &self.history[..self.history.len().min(n)]
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_none() && self.history.is_empty()
    }
}

/// One document per agent scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub users: BTreeMap<String, Bucket>,
    #[serde(default)]
    pub agents: BTreeMap<String, Bucket>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

impl Default for EmotionState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            users: BTreeMap::new(),
            agents: BTreeMap::new(),
        }
    }
}

impl EmotionState {
    pub fn repair(&mut self) {
        for bucket in self.users.values_mut().chain(self.agents.values_mut()) {
            bucket.repair();
        }
    }

    pub fn user(&self, key: &str) -> Option<&Bucket> {
        self.users.get(key)
    }

    pub fn agent(&self, key: &str) -> Option<&Bucket> {
        self.agents.get(key)
    }
}

// ============================================================================
// Normalization
// ============================================================================

pub fn normalize_label(raw: Option<&Value>, config: &EmotionConfig) -> String {
    let label = raw
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();
    if !label.is_empty() && config.allows_label(&label) {
        label
    } else {
        NEUTRAL_LABEL.to_string()
    }
}

pub fn normalize_intensity(raw: Option<&Value>) -> Intensity {
    match raw
        .and_then(Value::as_str)
        .map(|s| s.trim().to_ascii_lowercase())
        .as_deref()
    {
        Some("medium") => Intensity::Medium,
        Some("high") => Intensity::High,
        _ => Intensity::Low,
    }
}

/// Shape the reason into a single sentence-cased clause ending in terminal
/// punctuation. Empty or non-string input becomes `unsure`.
pub fn normalize_reason(raw: Option<&Value>, max_chars: usize) -> String {
    let Some(text) = raw.and_then(Value::as_str) else {
        return UNSURE_REASON.to_string();
    };
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return UNSURE_REASON.to_string();
    }

    let mut clause: String = collapsed.chars().take(max_chars.max(1)).collect();
    clause = clause.trim_end().to_string();

    let mut chars = clause.chars();
    if let Some(first) = chars.next() {
        clause = first.to_uppercase().chain(chars).collect();
    }
    if !clause.ends_with(['.', '!', '?']) {
        clause = clause.trim_end_matches([',', ';', ':', '-']).to_string();
        clause.push('.');
    }
    clause
}

/// Numbers and numeric strings pass through unchanged; anything else is 0.
pub fn normalize_confidence(raw: Option<&Value>) -> f64 {
    let value = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

// ============================================================================
// Tests
// ============================================================================
