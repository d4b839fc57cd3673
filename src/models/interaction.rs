use std::fmt;

use serde::{Deserialize, Serialize};

/// Provider name stamped on logs that originate from the push channel.
pub const OBSERVER_PROVIDER: &str = "Observer";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub id: String,
    pub text: String,
    pub timestamp: i64,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One recorded exchange, or one observer push when `user_tokens` is empty.
///
/// Logs are never edited after creation; the store only appends them or swaps
/// the whole collection for a fresh history snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InteractionLog {
    pub id: String,
    pub session_id: String,
    pub timestamp: i64,
    pub user_tokens: Vec<Token>,
    pub ai_response: String,
    pub provider_used: String,
}

impl InteractionLog {
    pub fn observer(id: String, session_id: String, timestamp: i64, payload: String) -> Self {
        Self {
            id,
            session_id,
            timestamp,
            user_tokens: Vec::new(),
            ai_response: payload,
            provider_used: OBSERVER_PROVIDER.to_string(),
        }
    }

    pub fn is_observer(&self) -> bool {
        self.user_tokens.is_empty() && self.provider_used == OBSERVER_PROVIDER
    }

    pub fn user_text(&self) -> String {
        self.user_tokens
            .iter()
            .map(|token| token.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Splits raw user input on whitespace into timestamped tokens.
pub fn tokenize_input(input: &str, now_ms: i64) -> Vec<Token> {
    input
        .split_whitespace()
        .enumerate()
        .map(|(index, text)| Token {
            id: format!("{now_ms}-{index}"),
            text: text.to_string(),
            timestamp: now_ms,
            tags: Vec::new(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverNotice {
    pub topic: String,
    pub message: String,
}

impl ObserverNotice {
    pub fn new(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ObserverNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.topic, self.message)
    }
}
