use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use coach_responder::config::AppConfig;
use coach_responder::models::PersonaConfig;
use coach_responder::services::ai::gemini::GeminiProvider;
use coach_responder::services::ai::groq::GroqProvider;
use coach_responder::services::ai::ollama::OllamaProvider;
use coach_responder::services::ai::LlmProvider;
use coach_responder::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let persona = PersonaConfig::load(config.persona_file.as_deref(), config.booking_url.as_deref())?;
    tracing::info!(persona = %persona.name, booking_url = %persona.booking_url, "persona loaded");

    let timeout = config.llm_timeout();
    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "groq" => {
            anyhow::ensure!(!config.groq_api_key.is_empty(), "GROQ_API_KEY must be set when LLM_PROVIDER=groq");
            tracing::info!("using Groq LLM provider (model: {})", config.groq_model);
            Box::new(GroqProvider::new(config.groq_api_key.clone(), config.groq_model.clone(), timeout))
        }
        "ollama" => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(config.ollama_url.clone(), config.ollama_model.clone(), timeout))
        }
        "gemini" => {
            anyhow::ensure!(!config.gemini_api_key.is_empty(), "GEMINI_API_KEY must be set when LLM_PROVIDER=gemini");
            tracing::info!("using Gemini LLM provider (model: {})", config.gemini_model);
            Box::new(GeminiProvider::new(config.gemini_api_key.clone(), config.gemini_model.clone(), timeout))
        }
        other => anyhow::bail!("unknown LLM_PROVIDER {other:?} (expected gemini, groq or ollama)"),
    };

    let state = Arc::new(AppState {
        config: config.clone(),
        persona: Arc::new(persona),
        llm,
    });

    let app = coach_responder::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
