use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::errors::AppError;
use crate::models::{ConversationTurn, HistoryMessage};
use crate::services::pipeline::ResponsePipeline;
use crate::state::AppState;

/// Body sent by the chat automation (ManyChat and friends).
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default, alias = "customer_message")]
    pub user_message: Option<String>,
    #[serde(default, alias = "customer_name")]
    pub user_name: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub response: String,
}

pub async fn chat_webhook(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> Result<Json<WebhookResponse>, AppError> {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("webhook", %request_id);

    handle_payload(&state, payload).instrument(span).await
}

async fn handle_payload(
    state: &AppState,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> Result<Json<WebhookResponse>, AppError> {
    tracing::info!("webhook received");

    let Json(payload) = payload.map_err(|e| {
        tracing::warn!(error = %e, "unreadable webhook body");
        AppError::InvalidJson
    })?;

    let turn = ConversationTurn::new(
        payload.user_name.as_deref(),
        payload.user_message.as_deref(),
        payload.history,
    )
    .ok_or(AppError::Validation("user_message"))?;

    tracing::info!(
        customer = %turn.customer_name,
        message = %turn.message,
        history = turn.history.len(),
        "processing message"
    );

    let reply = ResponsePipeline::from_state(state).run(&turn).await?;

    tracing::info!(intent = %reply.intent, response = %reply.text, "reply generated");

    Ok(Json(WebhookResponse {
        response: reply.text,
    }))
}
