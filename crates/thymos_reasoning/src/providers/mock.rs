//! Mock classifier: scripted results for tests and `--dry-run`.

use crate::classifier::{Classifier, ClassifierError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thymos_core::{RawClassification, Role};

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum MockReply {
    Ok(RawClassification),
    Fail(String),
}

/// Pops scripted replies in order; once exhausted it keeps returning the
/// default reply. Counts every call.
#[derive(Debug)]
pub struct MockClassifier {
    replies: Mutex<VecDeque<MockReply>>,
    default_reply: MockReply,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockClassifier {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            default_reply: MockReply::Ok(RawClassification::new(
                "calm",
                "low",
                "mock classification",
                0.9,
            )),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answer with `raw`.
    pub fn always(raw: RawClassification) -> Self {
        let mut mock = Self::new(Vec::new());
        mock.default_reply = MockReply::Ok(raw);
        mock
    }

    /// Always fail with a transport error.
    pub fn failing() -> Self {
        let mut mock = Self::new(Vec::new());
        mock.default_reply = MockReply::Fail("mock transport failure".to_string());
        mock
    }

    /// Sleep before answering; used to exercise the engine timeout.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait::async_trait]
impl Classifier for MockClassifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn classify(
        &self,
        _text: &str,
        _role: Role,
    ) -> Result<RawClassification, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = {
            let mut queue = self
                .replies
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            queue.pop_front().unwrap_or_else(|| self.default_reply.clone())
        };
        match reply {
            MockReply::Ok(raw) => Ok(raw),
            MockReply::Fail(msg) => Err(ClassifierError::Transport(msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_scripted_then_default() {
        let mock = MockClassifier::new(vec![
            MockReply::Ok(RawClassification::new("sad", "high", "x", 0.8)),
            MockReply::Fail("boom".into()),
        ]);
        let first = mock.classify("a", Role::User).await.unwrap();
        assert_eq!(first.label, Some(json!("sad")));
        assert!(mock.classify("b", Role::User).await.is_err());
        let third = mock.classify("c", Role::User).await.unwrap();
        assert_eq!(third.label, Some(json!("calm")));
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_mock_failing() {
        let mock = MockClassifier::failing();
        assert!(matches!(
            mock.classify("a", Role::User).await,
            Err(ClassifierError::Transport(_))
        ));
    }
}
