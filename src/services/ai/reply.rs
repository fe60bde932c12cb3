use crate::errors::GenerationError;
use crate::models::{ConversationTurn, Intent, PersonaConfig};
use crate::services::ai::{with_timeout, CallError, ChatOptions, LlmProvider, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPolicy {
    Required,
    Forbidden,
}

/// What the generator is told to do for a given intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyStrategy {
    pub directive: &'static str,
    pub link: LinkPolicy,
}

impl ReplyStrategy {
    pub fn for_intent(intent: Intent) -> Self {
        match intent {
            Intent::InfoSeeking => Self {
                directive: "The customer asked a question. Answer it directly and competently, based on your own experience and philosophy.",
                link: LinkPolicy::Forbidden,
            },
            Intent::ProblemDescription => Self {
                directive: "The customer described a personal problem. Show empathy, validate the problem and hint that an individual solution exists (e.g. \"I know that problem well, we'd need to look at your situation in detail.\"). Do not pitch an offer yet.",
                link: LinkPolicy::Forbidden,
            },
            Intent::BuyingSignal => Self {
                directive: "The customer is interested in working with you. Naturally propose a free initial consultation and include the booking link.",
                link: LinkPolicy::Required,
            },
            Intent::Smalltalk => Self {
                directive: "The customer is making small talk. Respond in a friendly way and ask one open-ended question to keep the conversation going. Do not make any offer.",
                link: LinkPolicy::Forbidden,
            },
        }
    }
}

pub async fn generate_reply(
    llm: &dyn LlmProvider,
    persona: &PersonaConfig,
    intent: Intent,
    turn: &ConversationTurn,
    options: &ChatOptions,
) -> Result<String, GenerationError> {
    let strategy = ReplyStrategy::for_intent(intent);

    let link_rule = match strategy.link {
        LinkPolicy::Required => format!("Booking link: {}", persona.booking_url),
        LinkPolicy::Forbidden => "Do not include any links.".to_string(),
    };
    let system = format!(
        "{}\n\nCustomer intent: {}\n{}\n{}",
        persona.to_prompt(),
        intent,
        strategy.directive,
        link_rule
    );

    let messages = [Message::user(format!(
        "Customer name: {}\nLast message: {}",
        turn.customer_name, turn.message
    ))];

    let raw = with_timeout(options.timeout, llm.chat(&system, &messages, options))
        .await
        .map_err(|e| match e {
            CallError::Provider(e) => GenerationError::Provider(e),
            CallError::Timeout(secs) => GenerationError::Timeout(secs),
        })?;

    finalize_reply(&raw, persona, strategy.link)
}

/// Enforces line budget and link policy on raw model text.
pub fn finalize_reply(
    raw: &str,
    persona: &PersonaConfig,
    link: LinkPolicy,
) -> Result<String, GenerationError> {
    let url = persona.booking_url.as_str();
    let text = raw.trim().trim_matches('"').trim();

    let mut lines: Vec<String> = text
        .lines()
        .map(|line| match link {
            LinkPolicy::Forbidden => strip_link(line, url),
            LinkPolicy::Required => line.to_string(),
        })
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    lines.truncate(persona.max_lines);

    if lines.is_empty() {
        return Err(GenerationError::EmptyReply);
    }

    if link == LinkPolicy::Required && !lines.iter().any(|l| l.contains(url)) {
        lines.push(url.to_string());
    }

    Ok(lines.join("\n"))
}

/// Removes the booking link from `line`, ignoring ASCII case and a trailing `/`.
fn strip_link(line: &str, url: &str) -> String {
    let needle = url.trim_end_matches('/').to_ascii_lowercase();
    if needle.is_empty() {
        return line.to_string();
    }

    // ASCII lowercasing keeps byte offsets aligned with `line`
    let haystack = line.to_ascii_lowercase();
    let mut out = String::with_capacity(line.len());
    let mut cursor = 0;
    for (start, matched) in haystack.match_indices(&needle) {
        if start < cursor {
            continue;
        }
        let mut end = start + matched.len();
        if haystack[end..].starts_with('/') {
            end += 1;
        }
        out.push_str(&line[cursor..start]);
        cursor = end;
    }
    out.push_str(&line[cursor..]);
    out
}
