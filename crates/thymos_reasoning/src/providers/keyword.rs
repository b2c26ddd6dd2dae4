//! Offline classifier backed by the keyword lexicon. Never fails.

use crate::classifier::{Classifier, ClassifierError};
use thymos_core::sentiment::analyze_emotion;
use thymos_core::{RawClassification, Role};

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

#[async_trait::async_trait]
impl Classifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn classify(
        &self,
        text: &str,
        _role: Role,
    ) -> Result<RawClassification, ClassifierError> {
        let m = analyze_emotion(text);
        let reason = match m.cue {
            Some(cue) => format!("mentions \"{}\"", cue.trim()),
            None => "no strong emotional cues".to_string(),
        };
        Ok(RawClassification::new(m.label, m.intensity, &reason, m.confidence))
    }
}
