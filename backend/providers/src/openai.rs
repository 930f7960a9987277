use std::time::Instant;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use labelguard_core::{ModelPart, ModelReply, ModelRequest, VisionModel};

/// OpenAI chat-completions provider with image input.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn body(&self, request: &ModelRequest) -> Value {
        let content: Vec<Value> = request
            .parts
            .iter()
            .map(|part| match part {
                ModelPart::Text(text) => json!({ "type": "text", "text": text }),
                ModelPart::InlineData { mime_type, data } => json!({
                    "type": "image_url",
                    "image_url": { "url": format!("data:{};base64,{}", mime_type, STANDARD.encode(data)) }
                }),
            })
            .collect();

        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": content }],
            "max_tokens": 2048
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl VisionModel for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply> {
        let start = Instant::now();

        debug!(model = %self.model, "Sending request to OpenAI");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.body(request))
            .send()
            .await
            .context("OpenAI HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            bail!("OpenAI returned {}: {}", status, error_body);
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(ModelReply {
            text,
            provider: "openai".to_string(),
            model: self.model.clone(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_uses_data_url() {
        let provider = OpenAiProvider::new("sk-test").with_model("gpt-4o-mini");
        let request = ModelRequest {
            parts: vec![
                ModelPart::InlineData {
                    mime_type: "image/jpeg".into(),
                    data: b"abc".to_vec(),
                },
                ModelPart::Text("Analyze".into()),
            ],
        };
        let body = provider.body(&request);
        assert_eq!(body["model"], "gpt-4o-mini");
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["image_url"]["url"], "data:image/jpeg;base64,YWJj");
        assert_eq!(content[1]["text"], "Analyze");
    }
}
