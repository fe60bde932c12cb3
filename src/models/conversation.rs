use serde::{Deserialize, Serialize};

use super::Intent;

pub const DEFAULT_CUSTOMER_NAME: &str = "Freund";
pub const MAX_HISTORY_MESSAGES: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
}

/// One incoming chat message. Lives for a single pipeline run.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub customer_name: String,
    pub message: String,
    pub history: Vec<HistoryMessage>,
}

impl ConversationTurn {
    /// Returns `None` when the message is missing or blank.
    pub fn new(
        customer_name: Option<&str>,
        message: Option<&str>,
        history: Vec<HistoryMessage>,
    ) -> Option<Self> {
        let message = message.map(str::trim).filter(|m| !m.is_empty())?;
        let customer_name = customer_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_CUSTOMER_NAME);

        let mut history: Vec<HistoryMessage> = history
            .into_iter()
            .filter(|m| !m.content.trim().is_empty())
            .map(|m| HistoryMessage {
                role: normalize_role(&m.role).to_string(),
                content: m.content,
            })
            .collect();
        if history.len() > MAX_HISTORY_MESSAGES {
            history.drain(..history.len() - MAX_HISTORY_MESSAGES);
        }

        Some(Self {
            customer_name: customer_name.to_string(),
            message: message.to_string(),
            history,
        })
    }
}

fn normalize_role(role: &str) -> &'static str {
    match role.trim().to_lowercase().as_str() {
        "assistant" | "bot" | "model" => "assistant",
        _ => "user",
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedReply {
    pub intent: Intent,
    pub text: String,
}
