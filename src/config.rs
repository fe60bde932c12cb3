use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub llm_provider: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub groq_api_key: String,
    pub groq_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub classifier_temperature: f32,
    pub generation_temperature: f32,
    pub llm_timeout_secs: u64,
    pub persona_file: Option<String>,
    pub booking_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            llm_provider: "gemini".to_string(),
            gemini_api_key: String::new(),
            gemini_model: "gemini-1.5-flash".to_string(),
            groq_api_key: String::new(),
            groq_model: "llama-3.1-8b-instant".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.2".to_string(),
            classifier_temperature: 0.0,
            generation_temperature: 0.8,
            llm_timeout_secs: 30,
            persona_file: None,
            booking_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or("PORT", defaults.port),
            llm_provider: non_empty_var("LLM_PROVIDER")
                .map(|v| v.to_lowercase())
                .unwrap_or(defaults.llm_provider),
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            groq_api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            groq_model: env::var("GROQ_MODEL").unwrap_or(defaults.groq_model),
            ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            classifier_temperature: parse_or(
                "CLASSIFIER_TEMPERATURE",
                defaults.classifier_temperature,
            ),
            generation_temperature: parse_or(
                "GENERATION_TEMPERATURE",
                defaults.generation_temperature,
            ),
            llm_timeout_secs: parse_or("LLM_TIMEOUT_SECS", defaults.llm_timeout_secs),
            persona_file: non_empty_var("PERSONA_FILE"),
            booking_url: non_empty_var("BOOKING_URL"),
        }
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs.max(1))
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    parse_value(env::var(key).ok().as_deref(), default)
}

fn parse_value<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
