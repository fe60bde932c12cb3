use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::PersonaConfig;
use crate::services::ai::LlmProvider;

pub struct AppState {
    pub config: AppConfig,
    pub persona: Arc<PersonaConfig>,
    pub llm: Box<dyn LlmProvider>,
}
