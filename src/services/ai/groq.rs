use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{http_client, ChatOptions, LlmProvider, Message};

const CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

pub struct GroqProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GroqProvider {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self {
            api_key,
            model,
            client: http_client(timeout),
        }
    }
}

/// OpenAI-style body: the system prompt rides as the first message.
fn request_body(
    model: &str,
    system_prompt: &str,
    messages: &[Message],
    temperature: f32,
) -> serde_json::Value {
    let chat_messages: Vec<serde_json::Value> =
        std::iter::once(json!({ "role": "system", "content": system_prompt }))
            .chain(
                messages
                    .iter()
                    .map(|msg| json!({ "role": msg.role, "content": msg.content })),
            )
            .collect();

    json!({
        "model": model,
        "messages": chat_messages,
        "temperature": temperature,
    })
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> anyhow::Result<String> {
        let body = request_body(&self.model, system_prompt, messages, options.temperature);

        let resp = self
            .client
            .post(CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to call Groq API")?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse Groq response")?;

        if !status.is_success() {
            anyhow::bail!("Groq API error ({}): {}", status, data["error"]["message"]);
        }

        data["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing content in Groq response"))
    }
}
