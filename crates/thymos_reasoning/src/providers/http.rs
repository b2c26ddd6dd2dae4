//! Plain HTTP classifier: POST `{text, role}`, expect the classification
//! object back as the response body.

use crate::classifier::{Classifier, ClassifierError};
use anyhow::Result;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use thymos_core::{RawClassification, Role};

#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: Client,
    url: String,
}

impl HttpClassifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: url.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl Classifier for HttpClassifier {
    fn name(&self) -> &str {
        "http"
    }

    async fn classify(&self, text: &str, role: Role) -> Result<RawClassification, ClassifierError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "text": text, "role": role.as_str() }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<RawClassification>(&body)
            .map_err(|e| ClassifierError::Malformed(format!("invalid classifier body: {}", e)))
    }
}
