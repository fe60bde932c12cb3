use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{http_client, ChatOptions, LlmProvider, Message};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self {
            api_key,
            model,
            client: http_client(timeout),
        }
    }
}

/// Gemini only knows "user" and "model" roles.
fn gemini_role(role: &str) -> &'static str {
    match role {
        "assistant" | "model" => "model",
        _ => "user",
    }
}

fn request_body(system_prompt: &str, messages: &[Message], temperature: f32) -> serde_json::Value {
    let contents: Vec<serde_json::Value> = messages
        .iter()
        .map(|msg| {
            json!({
                "role": gemini_role(&msg.role),
                "parts": [{ "text": msg.content }],
            })
        })
        .collect();

    json!({
        "systemInstruction": { "parts": [{ "text": system_prompt }] },
        "contents": contents,
        "generationConfig": { "temperature": temperature },
    })
}

fn extract_text(data: &serde_json::Value) -> anyhow::Result<String> {
    let parts = data["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| {
            let reason = data["candidates"][0]["finishReason"]
                .as_str()
                .or_else(|| data["promptFeedback"]["blockReason"].as_str())
                .unwrap_or("unknown");
            anyhow::anyhow!("missing content in Gemini response (reason: {reason})")
        })?;

    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    Ok(text)
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> anyhow::Result<String> {
        let body = request_body(system_prompt, messages, options.temperature);

        let resp = self
            .client
            .post(format!("{BASE_URL}/{}:generateContent", self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to call Gemini API")?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse Gemini response")?;

        if !status.is_success() {
            anyhow::bail!("Gemini API error ({}): {}", status, data["error"]["message"]);
        }

        extract_text(&data)
    }
}
