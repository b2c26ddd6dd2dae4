//! Store-wide retention: cap the number of tracked users per scope.
//!
//! Agent buckets are never pruned; their count follows deployment topology.

use chrono::{DateTime, Utc};
use thymos_core::EmotionState;

/// Drop the least recently active users until at most `max_users` remain.
///
/// Users are ranked by their latest entry's timestamp, oldest first. A bucket
/// with no latest entry (or an unparseable timestamp) ranks before everything
/// else; equal timestamps fall back to key order. `max_users == 0` disables
/// pruning. Returns the removed keys.
pub fn prune_users(state: &mut EmotionState, max_users: usize) -> Vec<String> {
    if max_users == 0 || state.users.len() <= max_users {
        return Vec::new();
    }

    let mut ranked: Vec<(Option<DateTime<Utc>>, String)> = state
        .users
        .iter()
        .map(|(key, bucket)| {
            let ts = bucket.latest.as_ref().and_then(|e| e.parsed_timestamp());
            (ts, key.clone())
        })
        .collect();
    // None sorts before Some.
    ranked.sort();

    let excess = state.users.len() - max_users;
    let removed: Vec<String> = ranked.into_iter().take(excess).map(|(_, key)| key).collect();
    for key in &removed {
        state.users.remove(key);
    }
    tracing::info!("Pruned {} inactive users: {:?}", removed.len(), removed);
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use thymos_core::entry::format_instant;
    use thymos_core::{Bucket, EmotionEntry, Intensity, Role};

    fn bucket_at(ts: Option<DateTime<Utc>>) -> Bucket {
        let mut bucket = Bucket::default();
        if let Some(ts) = ts {
            bucket.push(
                EmotionEntry {
                    timestamp: format_instant(ts),
                    label: "calm".to_string(),
                    intensity: Intensity::Low,
                    reason: "Fine.".to_string(),
                    confidence: 0.8,
                    source_hash: None,
                    source_role: Some(Role::User),
                },
                5,
            );
        }
        bucket
    }

    #[test]
    fn test_prunes_oldest() {
        let t1 = Utc::now() - Duration::hours(3);
        let t2 = t1 + Duration::hours(1);
        let t3 = t2 + Duration::hours(1);
        let mut state = EmotionState::default();
        state.users.insert("u3".into(), bucket_at(Some(t3)));
        state.users.insert("u1".into(), bucket_at(Some(t1)));
        state.users.insert("u2".into(), bucket_at(Some(t2)));

        let removed = prune_users(&mut state, 2);
        assert_eq!(removed, vec!["u1".to_string()]);
        assert!(state.users.contains_key("u2"));
        assert!(state.users.contains_key("u3"));
    }

    #[test]
    fn test_empty_bucket_goes_first() {
        let now = Utc::now();
        let mut state = EmotionState::default();
        state.users.insert("active".into(), bucket_at(Some(now)));
        state.users.insert("blank".into(), bucket_at(None));

        let removed = prune_users(&mut state, 1);
        assert_eq!(removed, vec!["blank".to_string()]);
    }

    #[test]
    fn test_agents_untouched_and_limit_respected() {
        let now = Utc::now();
        let mut state = EmotionState::default();
        for i in 0..5 {
            state
                .users
                .insert(format!("u{i}"), bucket_at(Some(now - Duration::minutes(i))));
            state
                .agents
                .insert(format!("a{i}"), bucket_at(Some(now - Duration::minutes(i))));
        }
        let removed = prune_users(&mut state, 3);
        assert_eq!(removed.len(), 2);
        assert_eq!(state.users.len(), 3);
        assert_eq!(state.agents.len(), 5);
        // u4 and u3 are the oldest.
        assert!(!state.users.contains_key("u4"));
        assert!(!state.users.contains_key("u3"));
    }

    #[test]
    fn test_zero_disables_and_under_limit_is_noop() {
        let mut state = EmotionState::default();
        state.users.insert("a".into(), bucket_at(None));
        state.users.insert("b".into(), bucket_at(None));
        assert!(prune_users(&mut state, 0).is_empty());
        assert!(prune_users(&mut state, 5).is_empty());
        assert_eq!(state.users.len(), 2);
    }
}
