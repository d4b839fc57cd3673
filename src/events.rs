use serde::Serialize;
use tokio::sync::broadcast;

use crate::{models::SystemStats, view::ViewMode};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuntimeEvent {
    BootAdvanced { cursor: usize },
    BootCompleted,
    ViewModeChanged { mode: ViewMode },
    LogsChanged { count: usize },
    ActiveSessionChanged { session_id: String },
    SubmittingChanged { submitting: bool },
    VitalsUpdated { stats: SystemStats },
}

/// Fan-out of runtime notifications to whatever UI is attached.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RuntimeEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: RuntimeEvent) {
        // No receivers attached is not an error.
        let _ = self.tx.send(event);
    }
}
