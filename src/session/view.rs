use std::collections::HashSet;

use serde::Serialize;

use crate::models::InteractionLog;

const TITLE_PREVIEW_CHARS: usize = 24;

/// Distinct session ids in first-appearance order, with `active` appended
/// when it has no logs yet.
pub fn list_sessions(logs: &[InteractionLog], active: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut sessions = Vec::new();
    for log in logs {
        if seen.insert(log.session_id.as_str()) {
            sessions.push(log.session_id.clone());
        }
    }
    if !seen.contains(active) {
        sessions.push(active.to_string());
    }
    sessions
}

pub fn logs_for(logs: &[InteractionLog], session_id: &str) -> Vec<InteractionLog> {
    logs.iter()
        .filter(|log| log.session_id == session_id)
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub log_count: usize,
    pub last_timestamp: Option<i64>,
}

/// Sidebar rows, in the same order as [`list_sessions`].
pub fn summarize_sessions(logs: &[InteractionLog], active: &str) -> Vec<SessionSummary> {
    list_sessions(logs, active)
        .into_iter()
        .map(|id| {
            let entries: Vec<&InteractionLog> =
                logs.iter().filter(|log| log.session_id == id).collect();
            let title = entries
                .iter()
                .map(|log| log.user_text())
                .find(|text| !text.is_empty())
                .map(|text| preview(&text))
                .unwrap_or_else(|| fallback_title(&id));
            SessionSummary {
                title,
                log_count: entries.len(),
                last_timestamp: entries.last().map(|log| log.timestamp),
                id,
            }
        })
        .collect()
}

fn preview(text: &str) -> String {
    if text.chars().count() <= TITLE_PREVIEW_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(TITLE_PREVIEW_CHARS).collect();
    short.push('…');
    short
}

fn fallback_title(session_id: &str) -> String {
    format!("session {}", session_id.chars().take(8).collect::<String>())
}
