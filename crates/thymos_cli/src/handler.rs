//! Hook handler: one bootstrap event in, one rendered block out.
//!
//! Every subsystem failure degrades instead of propagating: lock contention
//! skips the write, classifier errors become neutral entries, unreadable
//! state is treated as empty. Only malformed event input surfaces as an
//! error, and `main` swallows that too.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thymos_core::message::ContainerAdapter;
use thymos_core::{latest_for_role, parse_messages, ChatMessage, EmotionState, Role, ThymosConfig};
use thymos_expression::{render, RenderOptions};
use thymos_memory::{load_peers, prune_users, scope_dir_name, with_lock, StateStore};
use thymos_reasoning::{build_classifier, Classifier, MockClassifier, Turn, UpdateEngine};

/// User bucket key when the event does not name one.
pub const DEFAULT_USER_KEY: &str = "default";

#[derive(Debug, Clone, Deserialize)]
pub struct HookEvent {
    pub agent_id: String,
    #[serde(default)]
    pub user_key: Option<String>,
    #[serde(default)]
    pub session_file: Option<PathBuf>,
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub session: Option<Value>,
}

impl HookEvent {
    pub fn user_key(&self) -> &str {
        self.user_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or(DEFAULT_USER_KEY)
    }

    /// Inline messages win over the session file. Anything unrecognised
    /// yields no messages.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut inline = serde_json::Map::new();
        if let Some(messages) = &self.messages {
            inline.insert("messages".into(), messages.clone());
        }
        match &self.session {
            // A session handed over as raw text goes through the full chain.
            Some(Value::String(raw)) => return parse_messages(raw),
            Some(session) => {
                inline.insert("session".into(), session.clone());
            }
            None => {}
        }
        if let Some(messages) = ContainerAdapter::from_value(&Value::Object(inline)) {
            return messages;
        }
        let Some(path) = &self.session_file else {
            return Vec::new();
        };
        match std::fs::read_to_string(path) {
            Ok(raw) => parse_messages(&raw),
            Err(e) => {
                tracing::warn!("Cannot read session file {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }
}

fn read_event(input: Option<&Path>) -> Result<HookEvent> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read event from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("Failed to parse hook event")
}

fn classifier_for(config: &ThymosConfig, dry_run: bool) -> Result<Arc<dyn Classifier>> {
    if dry_run {
        return Ok(Arc::new(MockClassifier::default()));
    }
    build_classifier(&config.classifier, &config.emotion)
}

fn store_for(config: &ThymosConfig, scope: &str) -> StateStore {
    StateStore::for_scope(&config.store.root_dir(), &config.store.file_name, scope)
}

/// Read the event, update state, render.
pub async fn run_hook(
    input: Option<&Path>,
    config: &ThymosConfig,
    dry_run: bool,
) -> Result<Option<String>> {
    let event = read_event(input)?;
    let classifier = match classifier_for(config, dry_run) {
        Ok(c) => Some(c),
        Err(e) => {
            tracing::warn!("Classifier unavailable, rendering without update: {:#}", e);
            None
        }
    };
    Ok(handle_event(&event, config, classifier).await)
}

/// Run the locked update cycle (when there is something to classify and a
/// classifier) and render the block from the resulting state.
pub async fn handle_event(
    event: &HookEvent,
    config: &ThymosConfig,
    classifier: Option<Arc<dyn Classifier>>,
) -> Option<String> {
    let scope = scope_dir_name(&event.agent_id);
    let store = store_for(config, &scope);
    let messages = event.messages();
    let turn = Turn {
        user_key: event.user_key().to_string(),
        agent_key: scope.clone(),
        user_text: latest_for_role(&messages, Role::User).map(|m| m.content().to_string()),
        agent_text: latest_for_role(&messages, Role::Assistant).map(|m| m.content().to_string()),
    };

    let state = match classifier {
        Some(classifier) if turn.user_text.is_some() || turn.agent_text.is_some() => {
            let engine = UpdateEngine::new(
                classifier,
                config.emotion.clone(),
                config.classifier.timeout(),
            );
            update_locked(&store, &engine, &turn, config).await
        }
        _ => store.load(),
    };

    render_for(config, &state, event.user_key(), &scope)
}

async fn update_locked(
    store: &StateStore,
    engine: &UpdateEngine,
    turn: &Turn,
    config: &ThymosConfig,
) -> EmotionState {
    let result = with_lock(&store.lock_path(), config.store.lock_stale_after(), || async {
        let mut state = store.load();
        if engine.apply_turn(&mut state, turn).await {
            if let Err(e) = store.save(&state) {
                tracing::warn!("Emotion state not saved (non-fatal): {:#}", e);
            }
        }
        state
    })
    .await;

    match result {
        Ok(state) => state,
        Err(e) if e.is_busy() => {
            tracing::info!("State locked by another writer, skipping update this cycle");
            store.load()
        }
        Err(e) => {
            tracing::warn!("Lock failed, skipping update: {}", e);
            store.load()
        }
    }
}

fn render_for(
    config: &ThymosConfig,
    state: &EmotionState,
    user_key: &str,
    scope: &str,
) -> Option<String> {
    let peers = load_peers(
        &config.store.root_dir(),
        &config.store.file_name,
        scope,
        config.render.max_other_agents,
    );
    let options = RenderOptions::from_config(&config.render, &config.emotion, Utc::now());
    render(state, user_key, scope, &peers, &options)
}

/// Render an agent's current state without touching it.
pub fn show(config: &ThymosConfig, agent_id: &str, user_key: Option<&str>) -> Option<String> {
    let scope = scope_dir_name(agent_id);
    let state = store_for(config, &scope).load();
    render_for(config, &state, user_key.unwrap_or(DEFAULT_USER_KEY), &scope)
}

/// Apply user retention under the lock; returns the removed user keys.
pub async fn prune(config: &ThymosConfig, agent_id: &str) -> Result<Vec<String>> {
    let store = store_for(config, &scope_dir_name(agent_id));
    let removed = with_lock(&store.lock_path(), config.store.lock_stale_after(), || async {
        let mut state = store.load();
        let removed = prune_users(&mut state, config.emotion.max_users);
        if !removed.is_empty() {
            store.save(&state)?;
        }
        Ok::<_, anyhow::Error>(removed)
    })
    .await??;
    Ok(removed)
}
