//! Pull the classification object out of free-form model output.
//!
//! Models wrap JSON in prose or markdown fences. We take the first
//! brace-balanced object, tracking string literals so braces inside
//! strings do not end the scan early.

use crate::classifier::ClassifierError;
use thymos_core::RawClassification;

/// First balanced `{...}` slice in `text`, if any.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a model reply into a raw classification.
pub fn parse_classification(text: &str) -> Result<RawClassification, ClassifierError> {
    let trimmed = text.trim();
    let json = first_json_object(trimmed).ok_or_else(|| {
        ClassifierError::Malformed(format!(
            "no JSON object in reply: {}",
            trimmed.chars().take(120).collect::<String>()
        ))
    })?;
    serde_json::from_str::<RawClassification>(json)
        .map_err(|e| ClassifierError::Malformed(format!("invalid classification JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_clean_json() {
        let raw = parse_classification(
            r#"{"label": "happy", "intensity": "high", "reason": "good news", "confidence": 0.9}"#,
        )
        .unwrap();
        assert_eq!(raw.label, Some(json!("happy")));
        assert_eq!(raw.confidence, Some(json!(0.9)));
    }

    #[test]
    fn test_parse_code_block_wrapped() {
        let text = concat!(
            "Sure!\n```json\n",
            r#"{"label": "sad", "intensity": "low", "reason": "rain", "confidence": 0.6}"#,
            "\n```\nHope that helps {really}."
        );
        let raw = parse_classification(text).unwrap();
        assert_eq!(raw.label, Some(json!("sad")));
    }

    #[test]
    fn test_braces_inside_strings() {
        let text = concat!(
            r#"{"label": "confused", "reason": "what does {x} mean \" }","#,
            r#" "confidence": 0.7} trailing"#
        );
        let obj = first_json_object(text).unwrap();
        assert!(obj.ends_with("0.7}"));
        let raw = parse_classification(text).unwrap();
        assert_eq!(raw.label, Some(json!("confused")));
    }

    #[test]
    fn test_takes_first_object() {
        let text = r#"{"label": "calm"} {"label": "angry"}"#;
        assert_eq!(first_json_object(text), Some(r#"{"label": "calm"}"#));
    }

    #[test]
    fn test_missing_fields_are_lenient() {
        let raw = parse_classification(r#"{"label": "tired"}"#).unwrap();
        assert!(raw.confidence.is_none());
        assert!(raw.reason.is_none());
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            parse_classification("I cannot classify this"),
            Err(ClassifierError::Malformed(_))
        ));
        assert!(matches!(
            parse_classification("{ unbalanced"),
            Err(ClassifierError::Malformed(_))
        ));
        assert!(matches!(
            parse_classification("[1, 2]"),
            Err(ClassifierError::Malformed(_))
        ));
    }
}
