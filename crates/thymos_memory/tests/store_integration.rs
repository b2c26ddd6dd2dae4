//! Integration tests for the locked load-modify-save cycle.
//!
//! Uses tempfile::TempDir for isolated state directories.

use std::sync::Arc;
use std::time::Duration;
use thymos_core::entry::format_instant;
use thymos_core::{Bucket, EmotionEntry, Intensity, Role};
use thymos_memory::{load_peers, prune_users, with_lock, StateStore};

fn entry(label: &str) -> EmotionEntry {
    EmotionEntry {
        timestamp: format_instant(chrono::Utc::now()),
        label: label.to_string(),
        intensity: Intensity::Low,
        reason: "Test.".to_string(),
        confidence: 0.8,
        source_hash: None,
        source_role: Some(Role::User),
    }
}

/// Test 1: concurrent writers that retry on contention never lose an update.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_serialize() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(StateStore::for_scope(dir.path(), "emotion-state.json", "main"));

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let key = format!("user-{i}");
            loop {
                let outcome = with_lock(&store.lock_path(), Duration::from_secs(10), || async {
                    let mut state = store.load();
                    tokio::task::yield_now().await;
                    state
                        .users
                        .entry(key.clone())
                        .or_insert_with(Bucket::default)
                        .push(entry("calm"), 10);
                    store.save(&state)
                })
                .await;
                match outcome {
                    Ok(saved) => {
                        saved.unwrap();
                        break;
                    }
                    Err(e) if e.is_busy() => tokio::time::sleep(Duration::from_millis(5)).await,
                    Err(e) => panic!("unexpected lock error: {e}"),
                }
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let state = store.load();
    assert_eq!(state.users.len(), 8);
    assert!(!store.lock_path().exists());
}

/// Test 2: a contended cycle leaves the document untouched.
#[tokio::test]
async fn test_busy_lock_skips_mutation() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = StateStore::for_scope(dir.path(), "emotion-state.json", "main");
    let _held = thymos_memory::AdvisoryLock::acquire(&store.lock_path(), Duration::from_secs(10))
        .unwrap();

    let outcome = with_lock(&store.lock_path(), Duration::from_secs(10), || async {
        let mut state = store.load();
        state.users.insert("intruder".into(), Bucket::default());
        store.save(&state)
    })
    .await;

    assert!(outcome.unwrap_err().is_busy());
    assert!(!store.path().exists());
}

/// Test 3: retention + persistence + peer view round trip.
#[tokio::test]
async fn test_prune_persist_and_peer_view() {
    let dir = tempfile::TempDir::new().unwrap();
    let me = StateStore::for_scope(dir.path(), "emotion-state.json", "me");
    let other = StateStore::for_scope(dir.path(), "emotion-state.json", "other");

    let mut state = me.load();
    for i in 0..4 {
        let mut bucket = Bucket::default();
        bucket.push(entry("happy"), 5);
        state.users.insert(format!("u{i}"), bucket);
    }
    let removed = prune_users(&mut state, 2);
    assert_eq!(removed.len(), 2);
    me.save(&state).unwrap();
    assert_eq!(me.load().users.len(), 2);

    let mut other_state = other.load();
    let mut bucket = Bucket::default();
    bucket.push(entry("tired"), 5);
    other_state.agents.insert("other".into(), bucket);
    other.save(&other_state).unwrap();

    let peers = load_peers(dir.path(), "emotion-state.json", "me", 3);
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].id, "other");
    assert_eq!(peers[0].latest.label, "tired");
}
