pub mod gemini;
pub mod groq;
pub mod intent;
pub mod ollama;
pub mod reply;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Per-call knobs; the model itself is fixed per provider.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub temperature: f32,
    pub timeout: Duration,
}

impl ChatOptions {
    pub fn new(temperature: f32, timeout: Duration) -> Self {
        Self {
            temperature,
            timeout,
        }
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> anyhow::Result<String>;
}

pub(crate) enum CallError {
    Provider(anyhow::Error),
    Timeout(u64),
}

/// Bounds a provider call by `timeout` so a hung upstream fails one request only.
pub(crate) async fn with_timeout<F>(timeout: Duration, call: F) -> Result<String, CallError>
where
    F: Future<Output = anyhow::Result<String>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(CallError::Provider(e)),
        Err(_) => Err(CallError::Timeout(timeout.as_secs())),
    }
}

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to build HTTP client with timeout, using defaults");
            reqwest::Client::new()
        })
}
