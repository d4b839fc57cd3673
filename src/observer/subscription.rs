use anyhow::{Context, Result};
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{backend::PushChannel, session::SessionLogStore};

// Set to true to enable delivery logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// A live push-channel listener bound to the session that was active when it
/// was opened. Dropping it stops delivery; [`release`](Self::release) also
/// waits until the listener is gone.
pub struct ObserverSubscription {
    session_id: String,
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ObserverSubscription {
    pub fn open(
        push: &dyn PushChannel,
        channel: &str,
        session_id: String,
        store: SessionLogStore,
    ) -> Result<Self> {
        let rx = push
            .subscribe(channel)
            .with_context(|| format!("failed to subscribe to push channel '{channel}'"))?;

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(delivery_loop(
            rx,
            session_id.clone(),
            store,
            cancel_token.clone(),
        ));

        Ok(Self {
            session_id,
            cancel_token,
            handle: Some(handle),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn release(mut self) {
        self.cancel_token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                log_warn!("observer listener for session {} ended abnormally: {err}", self.session_id);
            }
        }
    }
}

impl Drop for ObserverSubscription {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn delivery_loop(
    mut rx: broadcast::Receiver<String>,
    session_id: String,
    store: SessionLogStore,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                drain_pending(&mut rx, &store, &session_id).await;
                break;
            }
            received = rx.recv() => match received {
                Ok(payload) => {
                    let log = store.append_observer_event(payload).await;
                    if log.session_id != session_id {
                        log_info!(
                            "observer event attributed to session {} (listener opened for {})",
                            log.session_id,
                            session_id
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log_warn!("observer listener for session {} skipped {} events", session_id, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    log_info!("push channel closed; observer listener for session {} exiting", session_id);
                    break;
                }
            }
        }
    }
}

/// Appends payloads already queued on the receiver so a release never loses
/// a push the listener had accepted.
async fn drain_pending(
    rx: &mut broadcast::Receiver<String>,
    store: &SessionLogStore,
    session_id: &str,
) {
    loop {
        match rx.try_recv() {
            Ok(payload) => {
                store.append_observer_event(payload).await;
            }
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                log_warn!("observer listener for session {} skipped {} events", session_id, skipped);
            }
            Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => break,
        }
    }
}
