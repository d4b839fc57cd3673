use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info};
use tokio::sync::{watch, Mutex};

use crate::{
    backend::AssistantBackend,
    capabilities::{ConfirmGate, IdSource},
    events::{EventBus, RuntimeEvent},
    models::InteractionLog,
};

use super::view::{self, SessionSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Applied { count: usize },
    /// A newer reload was issued while this one was in flight.
    Superseded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Declined,
    /// `new_active` is set when the deleted session was the active one.
    Deleted { new_active: Option<String> },
    Failed,
}

struct LogState {
    logs: Vec<InteractionLog>,
    active_session_id: String,
    reloads_issued: u64,
}

/// Authoritative in-memory log collection plus the active session id.
///
/// The collection is only ever swapped wholesale for a history snapshot or
/// appended to. The lock is never held across a backend call.
#[derive(Clone)]
pub struct SessionLogStore {
    state: Arc<Mutex<LogState>>,
    active_tx: Arc<watch::Sender<String>>,
    backend: Arc<dyn AssistantBackend>,
    confirm: Arc<dyn ConfirmGate>,
    ids: Arc<dyn IdSource>,
    events: EventBus,
}

impl SessionLogStore {
    pub fn new(
        backend: Arc<dyn AssistantBackend>,
        confirm: Arc<dyn ConfirmGate>,
        ids: Arc<dyn IdSource>,
        events: EventBus,
    ) -> Self {
        let active_session_id = ids.new_id();
        let (active_tx, _) = watch::channel(active_session_id.clone());
        Self {
            state: Arc::new(Mutex::new(LogState {
                logs: Vec::new(),
                active_session_id,
                reloads_issued: 0,
            })),
            active_tx: Arc::new(active_tx),
            backend,
            confirm,
            ids,
            events,
        }
    }

    pub async fn active_session_id(&self) -> String {
        self.state.lock().await.active_session_id.clone()
    }

    pub fn watch_active_session(&self) -> watch::Receiver<String> {
        self.active_tx.subscribe()
    }

    pub async fn logs(&self) -> Vec<InteractionLog> {
        self.state.lock().await.logs.clone()
    }

    /// Logs and active id read under one lock, for consistent derived views.
    pub async fn read_state(&self) -> (Vec<InteractionLog>, String) {
        let state = self.state.lock().await;
        (state.logs.clone(), state.active_session_id.clone())
    }

    pub async fn list_sessions(&self) -> Vec<String> {
        let state = self.state.lock().await;
        view::list_sessions(&state.logs, &state.active_session_id)
    }

    pub async fn session_summaries(&self) -> Vec<SessionSummary> {
        let state = self.state.lock().await;
        view::summarize_sessions(&state.logs, &state.active_session_id)
    }

    pub async fn logs_for(&self, session_id: &str) -> Vec<InteractionLog> {
        view::logs_for(&self.state.lock().await.logs, session_id)
    }

    /// Transcript of the active session.
    pub async fn transcript(&self) -> Vec<InteractionLog> {
        let state = self.state.lock().await;
        view::logs_for(&state.logs, &state.active_session_id)
    }

    /// Replaces the collection with the backend history.
    ///
    /// A failed fetch leaves the previous state in place. A fetch that
    /// completes after a newer reload was issued is discarded.
    pub async fn load_history(&self) -> ReloadOutcome {
        let ticket = {
            let mut state = self.state.lock().await;
            state.reloads_issued += 1;
            state.reloads_issued
        };

        let logs = match self.backend.fetch_history().await {
            Ok(logs) => logs,
            Err(err) => {
                error!("Failed to load history: {err:#}");
                return ReloadOutcome::Failed;
            }
        };

        let mut state = self.state.lock().await;
        if ticket != state.reloads_issued {
            debug!(
                "Discarding stale history reload {} (latest {})",
                ticket, state.reloads_issued
            );
            return ReloadOutcome::Superseded;
        }

        let active = match logs.last() {
            Some(last) => last.session_id.clone(),
            None => self.ids.new_id(),
        };
        let count = logs.len();
        state.logs = logs;
        self.events.emit(RuntimeEvent::LogsChanged { count });
        self.set_active(&mut state, active);
        ReloadOutcome::Applied { count }
    }

    pub async fn start_new_session(&self) -> String {
        let session_id = self.ids.new_id();
        let mut state = self.state.lock().await;
        self.set_active(&mut state, session_id.clone());
        info!("Started session {}", session_id);
        session_id
    }

    pub async fn delete_session(&self, session_id: &str) -> DeleteOutcome {
        if !self
            .confirm
            .confirm(&format!("Delete session {session_id} and all of its logs?"))
        {
            return DeleteOutcome::Declined;
        }

        let was_active = self.active_session_id().await == session_id;

        if let Err(err) = self.backend.delete_session(session_id).await {
            error!("Failed to delete session {}: {err:#}", session_id);
            return DeleteOutcome::Failed;
        }
        info!("Deleted session {}", session_id);

        self.load_history().await;

        if !was_active {
            return DeleteOutcome::Deleted { new_active: None };
        }

        let fresh = self.ids.new_id();
        let mut state = self.state.lock().await;
        self.set_active(&mut state, fresh.clone());
        DeleteOutcome::Deleted {
            new_active: Some(fresh),
        }
    }

    /// Appends an observer push to whichever session is active right now.
    pub async fn append_observer_event(&self, payload: String) -> InteractionLog {
        let mut state = self.state.lock().await;
        let log = InteractionLog::observer(
            self.ids.new_id(),
            state.active_session_id.clone(),
            Utc::now().timestamp_millis(),
            payload,
        );
        state.logs.push(log.clone());
        self.events.emit(RuntimeEvent::LogsChanged {
            count: state.logs.len(),
        });
        log
    }

    fn set_active(&self, state: &mut LogState, session_id: String) {
        if state.active_session_id == session_id {
            return;
        }
        state.active_session_id = session_id.clone();
        self.active_tx.send_replace(session_id.clone());
        self.events
            .emit(RuntimeEvent::ActiveSessionChanged { session_id });
    }
}
