//! Classifier providers and construction from config.

pub mod http;
pub mod keyword;
pub mod mock;
pub mod openai;

pub use http::HttpClassifier;
pub use keyword::KeywordClassifier;
pub use mock::{MockClassifier, MockReply};
pub use openai::OpenAiClassifier;

use crate::classifier::Classifier;
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use thymos_core::{ClassifierConfig, EmotionConfig};

/// Build the classifier selected by `config.provider`.
pub fn build_classifier(
    config: &ClassifierConfig,
    emotion: &EmotionConfig,
) -> Result<Arc<dyn Classifier>> {
    match config.provider.as_str() {
        "http" => {
            let url = config
                .url
                .as_deref()
                .context("classifier.url is required for the http provider")?;
            Ok(Arc::new(HttpClassifier::new(url, config.timeout())?))
        }
        "llm" | "openai" => Ok(Arc::new(OpenAiClassifier::new(config, &emotion.labels)?)),
        "keyword" => Ok(Arc::new(KeywordClassifier)),
        other => bail!("Unknown classifier provider: {}", other),
    }
}
