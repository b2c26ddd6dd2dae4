//! Simple keyword-based emotion lexicon.
//!
//! Backs the offline `keyword` classifier so the hook still produces entries
//! with no classifier endpoint configured. Deliberately small; a real
//! deployment points the classifier at a model.

/// Label -> cue words. Earlier rows win ties.
const LEXICON: &[(&str, &[&str])] = &[
    ("angry", &["angry", "furious", "hate", "pissed", "outraged", "livid"]),
    (
        "frustrated",
        &["frustrated", "annoying", "annoyed", "stuck", "again?", "still broken", "ugh"],
    ),
    ("anxious", &["worried", "anxious", "nervous", "scared", "afraid", "deadline"]),
    ("sad", &["sad", "unhappy", "depressed", "lonely", "miss", "sorry to hear"]),
    ("tired", &["tired", "exhausted", "sleepy", "burned out", "long day"]),
    ("confused", &["confused", "don't understand", "what do you mean", "lost", "unclear"]),
    ("grateful", &["thanks", "thank you", "grateful", "appreciate"]),
    ("excited", &["excited", "can't wait", "awesome", "amazing", "wow"]),
    ("happy", &["happy", "glad", "great", "love", "nice", "good news"]),
    ("curious", &["curious", "wonder", "how does", "why does", "what if"]),
    ("calm", &["fine", "okay", "relaxed", "no rush", "calm"]),
];

const INTENSE: &[&str] = &["very", "so ", "really", "extremely", "totally", "!!", "?!"];

/// Keyword match result: `(label, intensity, confidence, cue)`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMatch {
    pub label: &'static str,
    pub intensity: &'static str,
    pub confidence: f64,
    pub cue: Option<&'static str>,
}

/// Analyze text for the best-matching label.
///
/// Confidence grows with the number of matched cues; intensity with the
/// number of intensifiers (and shouting).
pub fn analyze_emotion(text: &str) -> KeywordMatch {
    let lower = text.to_lowercase();

    let mut best: Option<(&'static str, usize, &'static str)> = None;
    for (label, cues) in LEXICON {
        let hits: Vec<&'static str> = cues.iter().copied().filter(|c| lower.contains(c)).collect();
        if let Some(first) = hits.first() {
            if best.map_or(true, |(_, n, _)| hits.len() > n) {
                best = Some((label, hits.len(), first));
            }
        }
    }

    let Some((label, hits, cue)) = best else {
        return KeywordMatch {
            label: "neutral",
            intensity: "low",
            confidence: 0.5,
            cue: None,
        };
    };

    let mut boost = INTENSE.iter().filter(|w| lower.contains(*w)).count();
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() >= 4 && letters.iter().all(|c| c.is_uppercase()) {
        boost += 1;
    }
    let intensity = match boost {
        0 => "low",
        1 => "medium",
        _ => "high",
    };
    let confidence = (0.45 + 0.15 * hits as f64).min(0.9);

    KeywordMatch {
        label,
        intensity,
        confidence,
        cue: Some(cue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_text() {
        let m = analyze_emotion("The meeting is at three");
        assert_eq!(m.label, "neutral");
        assert_eq!(m.intensity, "low");
        assert!(m.cue.is_none());
    }

    #[test]
    fn test_frustrated_text() {
        let m = analyze_emotion("ugh, the build is still broken");
        assert_eq!(m.label, "frustrated");
        assert!(m.confidence > 0.5);
    }

    #[test]
    fn test_grateful_text() {
        let m = analyze_emotion("Thank you, I appreciate it");
        assert_eq!(m.label, "grateful");
    }

    #[test]
    fn test_intense_text() {
        let mild = analyze_emotion("I am happy");
        let strong = analyze_emotion("I am really so happy!!");
        assert_eq!(mild.intensity, "low");
        assert_eq!(strong.intensity, "high");
    }

    #[test]
    fn test_shouting_raises_intensity() {
        let m = analyze_emotion("I HATE THIS");
        assert_eq!(m.label, "angry");
        assert_eq!(m.intensity, "medium");
    }

    #[test]
    fn test_empty_text() {
        let m = analyze_emotion("");
        assert_eq!(m.label, "neutral");
    }
}
