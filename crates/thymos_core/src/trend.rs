//! Dominant-trend computation over a bucket's history.
//!
//! Each entry inside the window contributes `0.5^(age / half_life)` to its
//! label's total. Entries outside the window, in the future, or with a
//! timestamp we cannot parse are skipped entirely.

use crate::entry::EmotionEntry;
use chrono::{DateTime, Utc};

/// Weight of an entry `age_hours` old. A non-positive half-life disables decay.
pub fn decay_weight(age_hours: f64, half_life_hours: f64) -> f64 {
    if half_life_hours <= 0.0 {
        return 1.0;
    }
    0.5f64.powf(age_hours / half_life_hours)
}

/// Age of `entry` relative to `now`, in hours. `None` when unparseable.
pub fn age_hours(entry: &EmotionEntry, now: DateTime<Utc>) -> Option<f64> {
    let ts = entry.parsed_timestamp()?;
    Some((now - ts).num_milliseconds() as f64 / 3_600_000.0)
}

/// Per-label accumulated weight, in first-seen order.
pub fn label_weights(
    history: &[EmotionEntry],
    now: DateTime<Utc>,
    half_life_hours: f64,
    window_hours: f64,
) -> Vec<(String, f64)> {
    let mut totals: Vec<(String, f64)> = Vec::new();
    for entry in history {
        let Some(age) = age_hours(entry, now) else {
            continue;
        };
        if !(0.0..=window_hours).contains(&age) {
            continue;
        }
        let weight = decay_weight(age, half_life_hours);
        match totals.iter_mut().find(|(label, _)| *label == entry.label) {
            Some((_, total)) => *total += weight,
            None => totals.push((entry.label.clone(), weight)),
        }
    }
    totals
}

/// The label with the strictly greatest weight. On a tie the label seen first
/// while walking history (most recent first) keeps the lead.
/// `None` when no entry falls inside the window.
pub fn dominant_label(
    history: &[EmotionEntry],
    now: DateTime<Utc>,
    half_life_hours: f64,
    window_hours: f64,
) -> Option<String> {
    let mut best: Option<(String, f64)> = None;
    for (label, weight) in label_weights(history, now, half_life_hours, window_hours) {
        // An in-window entry counts even when its weight underflows to zero.
        match &best {
            Some((_, best_weight)) if weight <= *best_weight => {}
            _ => best = Some((label, weight)),
        }
    }
    best.map(|(label, _)| label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{format_instant, Intensity};
    use crate::message::Role;
    use chrono::Duration;

    fn base() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-18T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn at(label: &str, ts: DateTime<Utc>, intensity: Intensity, confidence: f64) -> EmotionEntry {
        EmotionEntry {
            timestamp: format_instant(ts),
            label: label.to_string(),
            intensity,
            reason: "Reason.".to_string(),
            confidence,
            source_hash: None,
            source_role: Some(Role::User),
        }
    }

    #[test]
    fn test_single_label_scenario() {
        let t = base();
        // Most recent first.
        let history = vec![
            at("frustrated", t + Duration::hours(1), Intensity::Low, 0.9),
            at("frustrated", t, Intensity::Medium, 0.8),
        ];
        let now = t + Duration::hours(1);
        assert_eq!(
            dominant_label(&history, now, 12.0, 24.0).as_deref(),
            Some("frustrated")
        );
        let weights = label_weights(&history, now, 12.0, 24.0);
        assert_eq!(weights.len(), 1);
        assert!(weights[0].1 > 0.0);
    }

    #[test]
    fn test_older_entry_weighs_less() {
        let w_new = decay_weight(1.0, 12.0);
        let w_old = decay_weight(5.0, 12.0);
        assert!(w_old < w_new);
        assert!((decay_weight(12.0, 12.0) - 0.5).abs() < 1e-12);
        assert_eq!(decay_weight(0.0, 12.0), 1.0);
    }

    #[test]
    fn test_outside_window_contributes_nothing() {
        let now = base();
        let history = vec![
            at("happy", now - Duration::hours(2), Intensity::Low, 0.9),
            at("sad", now - Duration::hours(30), Intensity::High, 0.9),
            at("sad", now - Duration::hours(31), Intensity::High, 0.9),
        ];
        let weights = label_weights(&history, now, 12.0, 24.0);
        assert_eq!(weights.len(), 1);
        assert_eq!(weights[0].0, "happy");
    }

    #[test]
    fn test_fully_expired_history_has_no_trend() {
        let now = base();
        let history = vec![at("sad", now - Duration::hours(48), Intensity::High, 0.9)];
        assert_eq!(dominant_label(&history, now, 12.0, 24.0), None);
        assert_eq!(dominant_label(&[], now, 12.0, 24.0), None);
    }

    #[test]
    fn test_future_and_unparseable_are_excluded() {
        let now = base();
        let mut bad = at("angry", now, Intensity::High, 0.9);
        bad.timestamp = "yesterday-ish".to_string();
        let history = vec![
            at("angry", now + Duration::hours(3), Intensity::High, 0.9),
            bad,
            at("calm", now - Duration::hours(1), Intensity::Low, 0.9),
        ];
        assert_eq!(dominant_label(&history, now, 12.0, 24.0).as_deref(), Some("calm"));
    }

    #[test]
    fn test_heavier_label_wins() {
        let now = base();
        let history = vec![
            at("happy", now - Duration::hours(1), Intensity::Low, 0.9),
            at("sad", now - Duration::hours(2), Intensity::Low, 0.9),
            at("sad", now - Duration::hours(3), Intensity::Low, 0.9),
        ];
        assert_eq!(dominant_label(&history, now, 12.0, 24.0).as_deref(), Some("sad"));
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let now = base();
        let ts = now - Duration::hours(1);
        let history = vec![
            at("calm", ts, Intensity::Low, 0.9),
            at("curious", ts, Intensity::Low, 0.9),
        ];
        assert_eq!(dominant_label(&history, now, 12.0, 24.0).as_deref(), Some("calm"));
    }

    #[test]
    fn test_zero_half_life_is_flat() {
        let now = base();
        let history = vec![
            at("happy", now - Duration::hours(1), Intensity::Low, 0.9),
            at("sad", now - Duration::hours(20), Intensity::Low, 0.9),
            at("sad", now - Duration::hours(21), Intensity::Low, 0.9),
        ];
        assert_eq!(dominant_label(&history, now, 0.0, 24.0).as_deref(), Some("sad"));
    }

    #[test]
    fn test_underflowed_weight_still_yields_trend() {
        let now = base();
        let history = vec![
            at("tired", now - Duration::hours(20), Intensity::Low, 0.9),
            at("sad", now - Duration::hours(22), Intensity::Low, 0.9),
        ];
        assert_eq!(decay_weight(20.0, 0.001), 0.0);
        assert_eq!(dominant_label(&history, now, 0.001, 24.0).as_deref(), Some("tired"));
    }
}
