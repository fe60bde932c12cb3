use crate::errors::ClassificationError;
use crate::models::{ConversationTurn, Intent, PersonaConfig};
use crate::services::ai::{with_timeout, CallError, ChatOptions, LlmProvider, Message};

const SYSTEM_PROMPT: &str = r#"You are a conversation analyst working silently in the background of a coach's Instagram inbox. Your strength is reading between the lines: you know when a chat should stay informative and when the customer is ready for the next step.

Categorize the customer's intent in their LATEST message into exactly ONE of these categories:
- INFO_SEEKING: the customer asks a general question about the coach, training or nutrition.
- PROBLEM_DESCRIPTION: the customer describes a personal problem (e.g. no motivation, pain, lack of results).
- BUYING_SIGNAL: the customer asks about pricing or the coaching process, or clearly shows interest in working with the coach.
- SMALLTALK: a greeting or a general remark unrelated to fitness.

If the message fits several categories, pick the most actionable one in this order:
BUYING_SIGNAL, then PROBLEM_DESCRIPTION, then INFO_SEEKING, then SMALLTALK.

Return ONLY the category name (no quotes, no explanation, no markdown)."#;

pub async fn classify_intent(
    llm: &dyn LlmProvider,
    persona: &PersonaConfig,
    turn: &ConversationTurn,
    options: &ChatOptions,
) -> Result<Intent, ClassificationError> {
    let mut messages: Vec<Message> = turn
        .history
        .iter()
        .map(|m| Message {
            role: m.role.clone(),
            content: m.content.clone(),
        })
        .collect();

    messages.push(Message::user(format!(
        "Customer name: {}\nLatest message: {}",
        turn.customer_name, turn.message
    )));

    let system = format!("{SYSTEM_PROMPT}\n\nThe coach is {}, {}.", persona.name, persona.role);

    let response = with_timeout(options.timeout, llm.chat(&system, &messages, options))
        .await
        .map_err(|e| match e {
            CallError::Provider(e) => ClassificationError::Provider(e),
            CallError::Timeout(secs) => ClassificationError::Timeout(secs),
        })?;

    parse_intent_label(&response)
}

/// Maps raw model output onto the closed label set, or fails.
pub fn parse_intent_label(response: &str) -> Result<Intent, ClassificationError> {
    let cleaned = strip_code_fences(response);

    if let Some(intent) = normalize_label(cleaned) {
        return Ok(intent);
    }

    // Some models insist on answering with JSON
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(cleaned) {
        let label = value
            .get("intent")
            .or_else(|| value.get("category"))
            .and_then(|v| v.as_str());
        if let Some(intent) = label.and_then(normalize_label) {
            return Ok(intent);
        }
    }

    // A single label buried in prose is accepted; several are ambiguous
    let upper = cleaned.to_uppercase();
    let mentioned: Vec<Intent> = Intent::ALL
        .into_iter()
        .filter(|intent| {
            contains_word(&upper, intent.as_str())
                || contains_word(&upper, &intent.as_str().replace('_', " "))
        })
        .collect();

    match mentioned.as_slice() {
        [intent] => Ok(*intent),
        _ => {
            tracing::warn!(
                response = %response,
                labels = mentioned.len(),
                "classifier returned no unambiguous intent label"
            );
            Err(ClassificationError::InvalidLabel(response.trim().to_string()))
        }
    }
}

fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let cleaned = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    cleaned.strip_suffix("```").unwrap_or(cleaned).trim()
}

fn is_decoration(c: char) -> bool {
    matches!(c, '"' | '\'' | '`' | '*' | '.' | '!' | ',' | ';' | ':') || c.is_whitespace()
}

fn normalize_label(raw: &str) -> Option<Intent> {
    let mut label = raw.trim_matches(is_decoration);

    // "3. BUYING_SIGNAL" / "3) BUYING_SIGNAL"
    let without_number = label.trim_start_matches(|c: char| c.is_ascii_digit());
    if without_number.len() != label.len() {
        label = without_number
            .trim_start_matches(|c: char| c == '.' || c == ')')
            .trim_start_matches(is_decoration);
    }

    for prefix in ["intent:", "category:"] {
        if label
            .get(..prefix.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(prefix))
        {
            label = label[prefix.len()..].trim_matches(is_decoration);
        }
    }

    let canonical: String = label
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();

    canonical.parse().ok()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + word.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}
