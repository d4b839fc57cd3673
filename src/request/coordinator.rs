use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::{debug, error};

use crate::{
    backend::AssistantBackend,
    events::{EventBus, RuntimeEvent},
    session::SessionLogStore,
};

use super::InputBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty or whitespace-only text; nothing happened.
    Blank,
    /// Another submission is still in flight; nothing happened.
    Busy,
    Sent,
    Failed,
}

/// Single-flight pipeline from compose box to backend and back into the store.
#[derive(Clone)]
pub struct RequestCoordinator {
    store: SessionLogStore,
    backend: Arc<dyn AssistantBackend>,
    input: InputBuffer,
    busy: Arc<AtomicBool>,
    events: EventBus,
}

impl RequestCoordinator {
    pub fn new(
        store: SessionLogStore,
        backend: Arc<dyn AssistantBackend>,
        input: InputBuffer,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            backend,
            input,
            busy: Arc::new(AtomicBool::new(false)),
            events,
        }
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    pub fn is_submitting(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Submits whatever the compose box currently holds.
    pub async fn submit_input(&self) -> SubmitOutcome {
        let text = self.input.text();
        self.submit(&text).await
    }

    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Blank;
        }

        let Some(_busy) = BusyGuard::acquire(&self.busy, &self.events) else {
            debug!("Submit ignored: a request is already in flight");
            return SubmitOutcome::Busy;
        };

        // Input is not restored on failure.
        self.input.clear();

        // Give renderers one turn to show the thinking state before the call.
        tokio::task::yield_now().await;

        let session_id = self.store.active_session_id().await;
        let outcome = match self.backend.ask(text, &session_id).await {
            Ok(()) => SubmitOutcome::Sent,
            Err(err) => {
                error!("ask failed for session {}: {err:#}", session_id);
                SubmitOutcome::Failed
            }
        };

        self.store.load_history().await;
        outcome
    }
}

/// Holds the busy flag for one submission and clears it on every exit path.
struct BusyGuard {
    flag: Arc<AtomicBool>,
    events: EventBus,
}

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>, events: &EventBus) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        events.emit(RuntimeEvent::SubmittingChanged { submitting: true });
        Some(Self {
            flag: Arc::clone(flag),
            events: events.clone(),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        self.events
            .emit(RuntimeEvent::SubmittingChanged { submitting: false });
    }
}
