use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use coach_responder::config::AppConfig;
use coach_responder::models::PersonaConfig;
use coach_responder::services::ai::{ChatOptions, LlmProvider, Message};
use coach_responder::state::AppState;

const BOOKING_URL: &str = "https://cal.example.org/coach";

// ── Mock Providers ──

#[derive(Debug, Clone)]
struct Call {
    stage: &'static str,
    system: String,
    messages: Vec<Message>,
}

type Calls = Arc<Mutex<Vec<Call>>>;

fn stage_of(system_prompt: &str) -> &'static str {
    if system_prompt.starts_with("You are a conversation analyst") {
        "classify"
    } else {
        "generate"
    }
}

/// Keyword classifier plus canned replies. The smalltalk reply sneaks the
/// booking link in so the link policy has something to strip.
struct MockLlm {
    calls: Calls,
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
        _options: &ChatOptions,
    ) -> anyhow::Result<String> {
        let stage = stage_of(system_prompt);
        self.calls.lock().unwrap().push(Call {
            stage,
            system: system_prompt.to_string(),
            messages: messages.to_vec(),
        });

        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");

        if stage == "classify" {
            let label = if last.contains("kostet") || last.contains("Preis") {
                "BUYING_SIGNAL"
            } else if last.contains("Motivation") {
                "PROBLEM_DESCRIPTION"
            } else if last.contains('?') {
                "INFO_SEEKING"
            } else {
                "SMALLTALK"
            };
            return Ok(label.to_string());
        }

        if system_prompt.contains("Customer intent: BUYING_SIGNAL") {
            Ok("Das schauen wir uns am besten gemeinsam an, ganz individuell.".to_string())
        } else if system_prompt.contains("Customer intent: SMALLTALK") {
            Ok(format!(
                "Hey, schön dass du schreibst!\nWas treibt dich gerade sportlich an?\n{BOOKING_URL}"
            ))
        } else {
            Ok("Ernährung macht 70% vom Erfolg aus.\nWie isst du aktuell?".to_string())
        }
    }
}

struct SlowLlm {
    calls: Calls,
}

#[async_trait]
impl LlmProvider for SlowLlm {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
        _options: &ChatOptions,
    ) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(Call {
            stage: stage_of(system_prompt),
            system: system_prompt.to_string(),
            messages: messages.to_vec(),
        });
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok("SMALLTALK".to_string())
    }
}

/// Classifies fine, then fails on generation.
struct BrokenGeneratorLlm {
    calls: Calls,
}

#[async_trait]
impl LlmProvider for BrokenGeneratorLlm {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
        _options: &ChatOptions,
    ) -> anyhow::Result<String> {
        let stage = stage_of(system_prompt);
        self.calls.lock().unwrap().push(Call {
            stage,
            system: system_prompt.to_string(),
            messages: messages.to_vec(),
        });
        match stage {
            "classify" => Ok("INFO_SEEKING".to_string()),
            _ => anyhow::bail!("Gemini API error (500 Internal Server Error): quota project 1234"),
        }
    }
}

/// Blows up inside the provider, like a bug in a client library would.
struct PanickingLlm;

#[async_trait]
impl LlmProvider for PanickingLlm {
    async fn chat(
        &self,
        _system_prompt: &str,
        _messages: &[Message],
        _options: &ChatOptions,
    ) -> anyhow::Result<String> {
        panic!("unexpected provider bug");
    }
}

/// Answers the classifier with a fixed raw text.
struct FixedLabelLlm {
    label: &'static str,
    calls: Calls,
}

#[async_trait]
impl LlmProvider for FixedLabelLlm {
    async fn chat(
        &self,
        system_prompt: &str,
        messages: &[Message],
        _options: &ChatOptions,
    ) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(Call {
            stage: stage_of(system_prompt),
            system: system_prompt.to_string(),
            messages: messages.to_vec(),
        });
        Ok(format!("{}\n{BOOKING_URL}", self.label))
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        llm_timeout_secs: 1,
        ..AppConfig::default()
    }
}

fn test_persona() -> PersonaConfig {
    PersonaConfig {
        booking_url: BOOKING_URL.to_string(),
        ..PersonaConfig::default()
    }
}

fn state_with(llm: Box<dyn LlmProvider>) -> Arc<AppState> {
    Arc::new(AppState {
        config: test_config(),
        persona: Arc::new(test_persona()),
        llm,
    })
}

fn test_app() -> (Router, Calls) {
    let calls: Calls = Arc::new(Mutex::new(vec![]));
    let llm = MockLlm {
        calls: Arc::clone(&calls),
    };
    (coach_responder::router(state_with(Box::new(llm))), calls)
}

fn webhook_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

fn stages(calls: &Calls) -> Vec<&'static str> {
    calls.lock().unwrap().iter().map(|c| c.stage).collect()
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let (app, calls) = test_app();
    let (status, json) = send(
        app,
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(stages(&calls).is_empty());
}

// ── Webhook: happy paths ──

#[tokio::test]
async fn test_buying_signal_includes_booking_link() {
    let (app, calls) = test_app();
    let (status, json) = send(
        app,
        webhook_request(r#"{"user_name":"Anna","user_message":"Was kostet ein Coaching?"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response = json["response"].as_str().unwrap();
    assert!(response.contains(BOOKING_URL), "missing link in {response:?}");

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].stage, "classify");
    assert_eq!(calls[1].stage, "generate");
    assert!(calls[1].system.contains(BOOKING_URL));
    assert!(calls[1].messages[0].content.contains("Customer name: Anna"));
}

#[tokio::test]
async fn test_smalltalk_defaults_name_and_strips_link() {
    let (app, calls) = test_app();
    let (status, json) = send(app, webhook_request(r#"{"user_message":"Hallo!"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    let response = json["response"].as_str().unwrap();
    assert!(!response.contains(BOOKING_URL));
    assert!(response.contains('?'));

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].messages[0].content.contains("Customer name: Freund"));
    assert!(calls[1].system.contains("Customer intent: SMALLTALK"));
    assert!(!calls[1].system.contains(BOOKING_URL));
}

#[tokio::test]
async fn test_problem_description_has_no_offer() {
    let (app, _calls) = test_app();
    let (status, json) = send(
        app,
        webhook_request(r#"{"user_name":"Tom","user_message":"Mir fehlt total die Motivation"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!json["response"].as_str().unwrap().contains(BOOKING_URL));
}

#[tokio::test]
async fn test_customer_field_aliases_accepted() {
    let (app, calls) = test_app();
    let (status, _json) = send(
        app,
        webhook_request(r#"{"customer_name":"Lea","customer_message":"Wie viel Eiweiß brauche ich?"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let calls = calls.lock().unwrap();
    assert!(calls[0].messages[0].content.contains("Customer name: Lea"));
    assert!(calls[1].system.contains("Customer intent: INFO_SEEKING"));
}

#[tokio::test]
async fn test_history_forwarded_to_classifier_only() {
    let (app, calls) = test_app();
    let (status, _json) = send(
        app,
        webhook_request(
            r#"{"user_message":"Und was kostet das?","history":[
                {"role":"user","content":"Ich will abnehmen"},
                {"role":"assistant","content":"Da helfe ich dir gern!"}
            ]}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].messages.len(), 3);
    assert_eq!(calls[0].messages[1].role, "assistant");
    assert_eq!(calls[1].messages.len(), 1);
}

// ── Webhook: validation ──

#[tokio::test]
async fn test_empty_message_rejected_without_model_calls() {
    let (app, calls) = test_app();
    let (status, json) = send(app, webhook_request(r#"{"user_message":""}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "'user_message' is a required field");
    assert_eq!(json["kind"], "validation_error");
    assert!(stages(&calls).is_empty());
}

#[tokio::test]
async fn test_missing_message_rejected() {
    let (app, calls) = test_app();
    let (status, json) = send(app, webhook_request(r#"{"user_name":"Anna"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "'user_message' is a required field");
    assert!(stages(&calls).is_empty());
}

#[tokio::test]
async fn test_invalid_json_rejected() {
    let (app, calls) = test_app();
    let (status, json) = send(app, webhook_request("user_message=hi")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid JSON format");
    assert!(stages(&calls).is_empty());
}

// ── Webhook: upstream failures ──

#[tokio::test]
async fn test_classifier_timeout_aborts_pipeline() {
    let calls: Calls = Arc::new(Mutex::new(vec![]));
    let app = coach_responder::router(state_with(Box::new(SlowLlm {
        calls: Arc::clone(&calls),
    })));

    let (status, json) = send(app, webhook_request(r#"{"user_message":"Hallo!"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred.");
    assert_eq!(json["kind"], "classification_error");
    assert!(json.get("response").is_none());
    assert_eq!(stages(&calls), vec!["classify"]);
}

#[tokio::test]
async fn test_generation_failure_is_generic_500() {
    let calls: Calls = Arc::new(Mutex::new(vec![]));
    let app = coach_responder::router(state_with(Box::new(BrokenGeneratorLlm {
        calls: Arc::clone(&calls),
    })));

    let (status, json) = send(
        app,
        webhook_request(r#"{"user_message":"Wie oft soll ich trainieren?"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["kind"], "generation_error");
    assert!(!json.to_string().contains("quota project"));
    assert!(json.get("response").is_none());
    assert_eq!(stages(&calls), vec!["classify", "generate"]);
}

#[tokio::test]
async fn test_panic_in_pipeline_is_generic_500() {
    let app = coach_responder::router(state_with(Box::new(PanickingLlm)));

    let (status, json) = send(app, webhook_request(r#"{"user_message":"Hallo!"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred.");
    assert_eq!(json["kind"], "internal_error");
    assert!(!json.to_string().contains("provider bug"));
    assert!(json.get("response").is_none());
}

#[tokio::test]
async fn test_panic_does_not_poison_later_requests() {
    let calls: Calls = Arc::new(Mutex::new(vec![]));
    let panicking = coach_responder::router(state_with(Box::new(PanickingLlm)));
    let healthy = coach_responder::router(state_with(Box::new(MockLlm {
        calls: Arc::clone(&calls),
    })));

    let (status, _) = send(panicking, webhook_request(r#"{"user_message":"Hallo!"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, json) = send(healthy, webhook_request(r#"{"user_message":"Hallo!"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["response"].is_string());
}

#[tokio::test]
async fn test_ambiguous_classifier_answer_never_reaches_generation() {
    let calls: Calls = Arc::new(Mutex::new(vec![]));
    let app = coach_responder::router(state_with(Box::new(FixedLabelLlm {
        label: "This is not a BUYING_SIGNAL. The customer just says hi, so: SMALLTALK",
        calls: Arc::clone(&calls),
    })));

    let (status, json) = send(app, webhook_request(r#"{"user_message":"Hallo!"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["kind"], "classification_error");
    assert!(!json.to_string().contains(BOOKING_URL));
    assert_eq!(stages(&calls), vec!["classify"]);
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let (app, calls) = test_app();

    let (a, b) = tokio::join!(
        send(
            app.clone(),
            webhook_request(r#"{"user_name":"Anna","user_message":"Was kostet ein Coaching?"}"#),
        ),
        send(app, webhook_request(r#"{"user_name":"Ben","user_message":"Hallo!"}"#)),
    );

    assert!(a.1["response"].as_str().unwrap().contains(BOOKING_URL));
    assert!(!b.1["response"].as_str().unwrap().contains(BOOKING_URL));
    assert_eq!(calls.lock().unwrap().len(), 4);
}
