//! Dedup & update engine.
//!
//! Decides whether a message needs classifying (fingerprint vs. the bucket's
//! latest entry), calls the classifier under a timeout, normalizes the result
//! and pushes it onto the bucket. Classifier failures never escape: they
//! become a neutral fallback entry carrying the same fingerprint, so an
//! identical message later is not retried.

use crate::classifier::{Classifier, ClassifierError};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thymos_core::{fingerprint, Bucket, EmotionConfig, EmotionEntry, EmotionState, Role};
use thymos_memory::prune_users;

/// Messages extracted from one triggering event.
#[derive(Debug, Clone, Default)]
pub struct Turn {
    pub user_key: String,
    pub agent_key: String,
    pub user_text: Option<String>,
    pub agent_text: Option<String>,
}

pub struct UpdateEngine {
    classifier: Arc<dyn Classifier>,
    config: EmotionConfig,
    timeout: Duration,
}

impl UpdateEngine {
    pub fn new(classifier: Arc<dyn Classifier>, config: EmotionConfig, timeout: Duration) -> Self {
        Self {
            classifier,
            config,
            timeout,
        }
    }

    pub fn config(&self) -> &EmotionConfig {
        &self.config
    }

    /// Classify `text` into `bucket` unless it is byte-identical to the
    /// message behind the bucket's latest entry. Returns whether the bucket
    /// changed.
    pub async fn maybe_update(&self, bucket: &mut Bucket, text: &str, role: Role) -> bool {
        let hash = fingerprint(text);
        if bucket.latest_hash() == Some(hash.as_str()) {
            tracing::debug!("Skipping {} message, unchanged since last classification", role);
            return false;
        }

        let entry = match self.classify_bounded(text, role).await {
            Ok(raw) => EmotionEntry::from_raw(&raw, role, Some(hash), &self.config, Utc::now()),
            Err(e) => {
                tracing::warn!(
                    "Classification via {} failed (non-fatal), storing neutral: {}",
                    self.classifier.name(),
                    e
                );
                EmotionEntry::fallback(role, Some(hash), Utc::now())
            }
        };

        tracing::info!(
            "Recorded {} emotion: {} ({}, confidence {:.2})",
            role,
            entry.label,
            entry.intensity,
            entry.confidence
        );
        bucket.push(entry, self.config.history_size);
        true
    }

    async fn classify_bounded(
        &self,
        text: &str,
        role: Role,
    ) -> Result<thymos_core::RawClassification, ClassifierError> {
        match tokio::time::timeout(self.timeout, self.classifier.classify(text, role)).await {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::Timeout(self.timeout)),
        }
    }

    /// Update the user and/or agent bucket for one turn, then apply user
    /// retention. Returns whether the state changed.
    ///
    /// Both classifications run concurrently, so a turn holds the caller's
    /// lock for at most one classifier timeout.
    pub async fn apply_turn(&self, state: &mut EmotionState, turn: &Turn) -> bool {
        let users = &mut state.users;
        let agents = &mut state.agents;

        let user_update = async move {
            match non_blank(turn.user_text.as_deref()) {
                Some(text) => {
                    let bucket = users.entry(turn.user_key.clone()).or_default();
                    self.maybe_update(bucket, text, Role::User).await
                }
                None => false,
            }
        };
        let agent_update = async move {
            match non_blank(turn.agent_text.as_deref()) {
                Some(text) => {
                    let bucket = agents.entry(turn.agent_key.clone()).or_default();
                    self.maybe_update(bucket, text, Role::Assistant).await
                }
                None => false,
            }
        };
        let (user_changed, agent_changed) = tokio::join!(user_update, agent_update);

        let pruned = !prune_users(state, self.config.max_users).is_empty();
        user_changed || agent_changed || pruned
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}
