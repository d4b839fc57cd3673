use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{backend::PushChannel, session::SessionLogStore};

use super::ObserverSubscription;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Keeps exactly one push-channel listener alive, re-opened every time the
/// active session changes.
#[derive(Clone)]
pub struct EventInjector {
    store: SessionLogStore,
    push: Arc<dyn PushChannel>,
    channel: String,
    worker: Arc<Mutex<Option<(CancellationToken, JoinHandle<()>)>>>,
}

impl EventInjector {
    pub fn new(store: SessionLogStore, push: Arc<dyn PushChannel>, channel: impl Into<String>) -> Self {
        Self {
            store,
            push,
            channel: channel.into(),
            worker: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            bail!("event injector already running");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(supervise(
            self.store.clone(),
            Arc::clone(&self.push),
            self.channel.clone(),
            cancel_token.clone(),
        ));
        *worker = Some((cancel_token, handle));
        Ok(())
    }

    /// Releases the current listener and waits for it to be gone.
    pub async fn stop(&self) -> Result<()> {
        let Some((cancel_token, handle)) = self.worker.lock().await.take() else {
            return Ok(());
        };
        cancel_token.cancel();
        handle.await.context("event injector task failed to join")
    }
}

async fn supervise(
    store: SessionLogStore,
    push: Arc<dyn PushChannel>,
    channel: String,
    cancel_token: CancellationToken,
) {
    let mut active_rx = store.watch_active_session();

    loop {
        let session_id = active_rx.borrow_and_update().clone();
        let subscription =
            match ObserverSubscription::open(push.as_ref(), &channel, session_id.clone(), store.clone()) {
                Ok(subscription) => {
                    log_info!("listening on '{}' for session {}", channel, session_id);
                    Some(subscription)
                }
                Err(err) => {
                    log_error!("observer subscription for session {} failed: {err:#}", session_id);
                    None
                }
            };

        let keep_running = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => false,
            changed = active_rx.changed() => changed.is_ok(),
        };

        if let Some(subscription) = subscription {
            subscription.release().await;
        }

        if !keep_running {
            break;
        }
    }
}
