use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::events::{EventBus, RuntimeEvent};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    Boot,
    Chat,
}

impl Default for ViewMode {
    fn default() -> Self {
        ViewMode::Boot
    }
}

/// One-way `boot -> chat` switch. Only the boot sequencer flips it.
#[derive(Clone)]
pub struct ViewModeController {
    tx: Arc<watch::Sender<ViewMode>>,
    events: EventBus,
}

impl ViewModeController {
    pub fn new(events: EventBus) -> Self {
        let (tx, _) = watch::channel(ViewMode::Boot);
        Self {
            tx: Arc::new(tx),
            events,
        }
    }

    pub fn mode(&self) -> ViewMode {
        *self.tx.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<ViewMode> {
        self.tx.subscribe()
    }

    /// Resolves once the chat view is showing.
    pub async fn wait_for_chat(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|mode| *mode == ViewMode::Chat).await;
    }

    /// Returns whether this call performed the transition.
    pub(crate) fn enter_chat(&self) -> bool {
        let switched = self.tx.send_if_modified(|mode| {
            if *mode == ViewMode::Boot {
                *mode = ViewMode::Chat;
                true
            } else {
                false
            }
        });

        if switched {
            info!("View switched to chat");
            self.events.emit(RuntimeEvent::ViewModeChanged {
                mode: ViewMode::Chat,
            });
        }
        switched
    }
}
