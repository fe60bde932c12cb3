use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{http_client, ChatOptions, LlmProvider, Message};

pub struct OllamaProvider {
    url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(url: String, model: String, timeout: Duration) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            model,
            client: http_client(timeout),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.url)
    }
}

/// Non-streaming `/api/chat` body; temperature goes under `options`.
fn request_body(
    model: &str,
    system_prompt: &str,
    messages: &[Message],
    temperature: f32,
) -> serde_json::Value {
    let mut ollama_messages = vec![json!({
        "role": "system",
        "content": system_prompt,
    })];
    ollama_messages.extend(
        messages
            .iter()
            .map(|msg| json!({ "role": msg.role, "content": msg.content })),
    );

    json!({
        "model": model,
        "messages": ollama_messages,
        "stream": false,
        "options": { "temperature": temperature },
    })
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> anyhow::Result<String> {
        let body = request_body(&self.model, system_prompt, messages, options.temperature);

        let resp = self
            .client
            .post(self.chat_url())
            .json(&body)
            .send()
            .await
            .context("failed to call Ollama API")?
            .error_for_status()
            .context("Ollama API returned error")?;

        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse Ollama response")?;

        data["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing content in Ollama response"))
    }
}
