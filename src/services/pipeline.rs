use std::time::Instant;

use crate::errors::PipelineError;
use crate::models::{ConversationTurn, GeneratedReply, PersonaConfig};
use crate::services::ai::intent::classify_intent;
use crate::services::ai::reply::generate_reply;
use crate::services::ai::{ChatOptions, LlmProvider};
use crate::state::AppState;

/// Classify, then generate. Built per request; holds no state of its own.
pub struct ResponsePipeline<'a> {
    llm: &'a dyn LlmProvider,
    persona: &'a PersonaConfig,
    classifier_options: ChatOptions,
    generator_options: ChatOptions,
}

impl<'a> ResponsePipeline<'a> {
    pub fn new(
        llm: &'a dyn LlmProvider,
        persona: &'a PersonaConfig,
        classifier_options: ChatOptions,
        generator_options: ChatOptions,
    ) -> Self {
        Self {
            llm,
            persona,
            classifier_options,
            generator_options,
        }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        let timeout = state.config.llm_timeout();
        Self::new(
            state.llm.as_ref(),
            &state.persona,
            ChatOptions::new(state.config.classifier_temperature, timeout),
            ChatOptions::new(state.config.generation_temperature, timeout),
        )
    }

    pub async fn run(&self, turn: &ConversationTurn) -> Result<GeneratedReply, PipelineError> {
        let started = Instant::now();
        let intent =
            classify_intent(self.llm, self.persona, turn, &self.classifier_options).await?;
        let classified_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            customer = %turn.customer_name,
            intent = %intent,
            elapsed_ms = classified_ms,
            "classified message"
        );

        let text =
            generate_reply(self.llm, self.persona, intent, turn, &self.generator_options).await?;

        tracing::info!(
            customer = %turn.customer_name,
            intent = %intent,
            elapsed_ms = started.elapsed().as_millis() as u64 - classified_ms,
            "generated reply"
        );

        Ok(GeneratedReply { intent, text })
    }
}
