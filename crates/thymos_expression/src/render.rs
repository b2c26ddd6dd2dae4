//! Block renderer: turns buckets, trends and peers into the tagged text
//! block injected into the prompt.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt::Write;
use thymos_core::{
    dominant_label, Bucket, EmotionConfig, EmotionEntry, EmotionState, Intensity, RenderConfig,
};
use thymos_memory::Peer;

const EMPTY_SECTION: &str = "No recent entries.";

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub max_user_entries: usize,
    pub max_agent_entries: usize,
    pub max_other_agents: usize,
    pub half_life_hours: f64,
    pub trend_window_hours: f64,
    pub timezone: Tz,
    pub now: DateTime<Utc>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default(), &EmotionConfig::default(), Utc::now())
    }
}

impl RenderOptions {
    /// Unknown timezone names fall back to UTC.
    pub fn from_config(render: &RenderConfig, emotion: &EmotionConfig, now: DateTime<Utc>) -> Self {
        let timezone = render.timezone.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!("Unknown timezone '{}', rendering in UTC", render.timezone);
            Tz::UTC
        });
        Self {
            max_user_entries: render.max_user_entries,
            max_agent_entries: render.max_agent_entries,
            max_other_agents: render.max_other_agents,
            half_life_hours: emotion.half_life_hours,
            trend_window_hours: emotion.trend_window_hours,
            timezone,
            now,
        }
    }
}

pub fn intensity_word(intensity: Intensity) -> &'static str {
    match intensity {
        Intensity::Low => "mildly",
        Intensity::Medium => "moderately",
        Intensity::High => "strongly",
    }
}

/// `YYYY-MM-DD HH:MM` in `tz`; the raw string when it does not parse.
pub fn format_timestamp(raw: &str, tz: Tz) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn describe(entry: &EmotionEntry) -> String {
    format!(
        "Felt {} {} because {}",
        intensity_word(entry.intensity),
        entry.label,
        entry.reason
    )
}

/// Entry lines plus the optional trend line. Empty when the bucket has
/// nothing to show.
fn section_lines(
    bucket: Option<&Bucket>,
    max_entries: usize,
    options: &RenderOptions,
) -> Vec<String> {
    let Some(bucket) = bucket else {
        return Vec::new();
    };

    let mut lines: Vec<String> = bucket
        .recent(max_entries)
        .iter()
        .map(|e| format!("{}: {}", format_timestamp(&e.timestamp, options.timezone), describe(e)))
        .collect();

    if let Some(label) = dominant_label(
        &bucket.history,
        options.now,
        options.half_life_hours,
        options.trend_window_hours,
    ) {
        lines.push(format!(
            "Trend (last {}h): mostly {}.",
            options.trend_window_hours, label
        ));
    }
    lines
}

fn push_section(out: &mut String, tag: &str, lines: &[String]) {
    let _ = writeln!(out, "<{}>", tag);
    if lines.is_empty() {
        let _ = writeln!(out, "{}", EMPTY_SECTION);
    }
    for line in lines {
        let _ = writeln!(out, "{}", line);
    }
    let _ = writeln!(out, "</{}>", tag);
}

/// Render the block for one user/agent pair. `None` means there is nothing
/// worth injecting.
pub fn render(
    state: &EmotionState,
    user_key: &str,
    agent_id: &str,
    peers: &[Peer],
    options: &RenderOptions,
) -> Option<String> {
    let user = section_lines(state.user(user_key), options.max_user_entries, options);
    let agent = section_lines(state.agent(agent_id), options.max_agent_entries, options);
    let others: Vec<String> = peers
        .iter()
        .filter(|p| p.id != agent_id)
        .take(options.max_other_agents)
        .map(|p| {
            format!(
                "{} ({}): {}",
                p.id,
                format_timestamp(&p.latest.timestamp, options.timezone),
                describe(&p.latest)
            )
        })
        .collect();

    if user.is_empty() && agent.is_empty() && others.is_empty() {
        return None;
    }

    let mut out = String::from("<emotion_state>\n");
    push_section(&mut out, "user", &user);
    push_section(&mut out, "agent", &agent);
    if !others.is_empty() {
        push_section(&mut out, "others", &others);
    }
    out.push_str("</emotion_state>");
    Some(out)
}
