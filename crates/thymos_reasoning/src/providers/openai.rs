use crate::classifier::{Classifier, ClassifierError};
use crate::extraction::parse_classification;
use crate::prompts::{classifier_system_prompt, classifier_user_prompt};
use anyhow::Result;
use reqwest::Client;
use serde_json::{json, Value};
use thymos_core::{ClassifierConfig, RawClassification, Role};

/// Classifier backed by an OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClassifier {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f32,
    system_prompt: String,
}

impl OpenAiClassifier {
    pub fn new(config: &ClassifierConfig, labels: &[String]) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(config.timeout()).build()?,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            system_prompt: classifier_system_prompt(labels),
        })
    }
}

#[async_trait::async_trait]
impl Classifier for OpenAiClassifier {
    fn name(&self) -> &str {
        "openai"
    }

    async fn classify(&self, text: &str, role: Role) -> Result<RawClassification, ClassifierError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": self.system_prompt},
                {"role": "user", "content": classifier_user_prompt(text, role.as_str())},
            ],
            "temperature": self.temperature,
            "max_tokens": 200,
        });

        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self.client.post(&url).json(&payload);
        // Local OpenAI-compatible servers usually run without a key.
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let resp_json: Value = response.json().await?;
        let content = resp_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ClassifierError::Malformed("completion has no text content".into()))?;

        tracing::debug!("Classifier reply: {}", content);
        parse_classification(content)
    }
}
