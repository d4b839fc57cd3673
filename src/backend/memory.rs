use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{tokenize_input, InteractionLog};

use super::{AssistantBackend, PushChannel};

const PUSH_CAPACITY: usize = 32;

type Responder = dyn Fn(&str) -> String + Send + Sync;

/// In-process backend: keeps history in memory, answers with a pluggable
/// responder and fans out named push channels.
#[derive(Clone)]
pub struct InMemoryBackend {
    inner: Arc<BackendInner>,
}

struct BackendInner {
    provider: String,
    responder: Box<Responder>,
    logs: Mutex<Vec<InteractionLog>>,
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
    ask_calls: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_responder("echo", |input| input.to_string())
    }

    pub fn with_responder<F>(provider: impl Into<String>, responder: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(BackendInner {
                provider: provider.into(),
                responder: Box::new(responder),
                logs: Mutex::new(Vec::new()),
                channels: Mutex::new(HashMap::new()),
                ask_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Seeds history, e.g. from a previously exported snapshot.
    pub fn with_history(self, logs: Vec<InteractionLog>) -> Self {
        *lock(&self.inner.logs) = logs;
        self
    }

    pub fn ask_calls(&self) -> usize {
        self.inner.ask_calls.load(Ordering::SeqCst)
    }

    pub fn history(&self) -> Vec<InteractionLog> {
        lock(&self.inner.logs).clone()
    }

    /// Publishes `payload` on `channel`; returns how many subscribers saw it.
    pub fn emit(&self, channel: &str, payload: impl Into<String>) -> usize {
        let channels = lock(&self.inner.channels);
        channels
            .get(channel)
            .and_then(|tx| tx.send(payload.into()).ok())
            .unwrap_or(0)
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        lock(&self.inner.channels)
            .get(channel)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssistantBackend for InMemoryBackend {
    async fn ask(&self, input: &str, session_id: &str) -> Result<()> {
        self.inner.ask_calls.fetch_add(1, Ordering::SeqCst);
        if session_id.is_empty() {
            bail!("session id is required");
        }

        let now_ms = Utc::now().timestamp_millis();
        let log = InteractionLog {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            timestamp: now_ms,
            user_tokens: tokenize_input(input, now_ms),
            ai_response: (self.inner.responder)(input),
            provider_used: self.inner.provider.clone(),
        };
        lock(&self.inner.logs).push(log);
        Ok(())
    }

    async fn fetch_history(&self) -> Result<Vec<InteractionLog>> {
        Ok(self.history())
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let mut logs = lock(&self.inner.logs);
        let before = logs.len();
        logs.retain(|log| log.session_id != session_id);
        info!(
            "Deleted {} logs for session {}",
            before - logs.len(),
            session_id
        );
        Ok(())
    }
}

impl PushChannel for InMemoryBackend {
    fn subscribe(&self, channel: &str) -> Result<broadcast::Receiver<String>> {
        let mut channels = lock(&self.inner.channels);
        let tx = channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(PUSH_CAPACITY).0);
        Ok(tx.subscribe())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ask_appends_tokenized_exchange() {
        let backend = InMemoryBackend::with_responder("llama", |input| input.to_uppercase());
        backend.ask("open notes", "s1").await.unwrap();

        let history = backend.fetch_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].session_id, "s1");
        assert_eq!(history[0].user_text(), "open notes");
        assert_eq!(history[0].ai_response, "OPEN NOTES");
        assert_eq!(history[0].provider_used, "llama");
        assert_eq!(backend.ask_calls(), 1);
    }

    #[tokio::test]
    async fn delete_only_drops_matching_session() {
        let backend = InMemoryBackend::new();
        backend.ask("one", "s1").await.unwrap();
        backend.ask("two", "s2").await.unwrap();
        backend.ask("three", "s1").await.unwrap();

        backend.delete_session("s1").await.unwrap();

        let sessions: Vec<_> = backend
            .history()
            .into_iter()
            .map(|log| log.session_id)
            .collect();
        assert_eq!(sessions, ["s2"]);
    }

    #[tokio::test]
    async fn emit_reaches_live_subscribers_only() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.emit("observer-event", "lost"), 0);

        let mut rx = backend.subscribe("observer-event").unwrap();
        assert_eq!(backend.subscriber_count("observer-event"), 1);
        assert_eq!(backend.emit("observer-event", "hello"), 1);
        assert_eq!(rx.recv().await.unwrap(), "hello");

        drop(rx);
        assert_eq!(backend.subscriber_count("observer-event"), 0);
    }
}
