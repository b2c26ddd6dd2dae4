/// Fixed instruction for chat-completion classifiers. The model must answer
/// with a single JSON object; anything around it is ignored by the parser.
pub const CLASSIFIER_SYSTEM_PROMPT: &str = r#"You are an emotion classification module. You receive one chat message and the role of its author (user or assistant).

Rules:
1. Pick the single emotion that best describes the author while writing it.
2. label must be one of: {labels}
3. intensity is one of: low, medium, high
4. reason is a short clause (under 15 words) explaining the choice, without quoting the message
5. confidence is a number between 0 and 1; use low values when the message carries little emotional signal
6. Do not add commentary

Reply with JSON only:
{"label": "frustrated", "intensity": "medium", "reason": "the build keeps failing", "confidence": 0.8}"#;

pub fn classifier_system_prompt(labels: &[String]) -> String {
    CLASSIFIER_SYSTEM_PROMPT.replace("{labels}", &labels.join(", "))
}

pub fn classifier_user_prompt(text: &str, role: &str) -> String {
    format!("Role: {}\nMessage:\n{}", role, text)
}
