use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    backend::StatsProvider,
    events::{EventBus, RuntimeEvent},
    models::SystemStats,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Polls the stats provider on a fixed interval into a single slot. A failed
/// poll keeps the previous reading.
#[derive(Clone)]
pub struct VitalsPoller {
    provider: Arc<dyn StatsProvider>,
    slot: Arc<RwLock<Option<SystemStats>>>,
    interval: Duration,
    events: EventBus,
    worker: Arc<Mutex<Option<(CancellationToken, JoinHandle<()>)>>>,
}

impl VitalsPoller {
    pub fn new(provider: Arc<dyn StatsProvider>, interval: Duration, events: EventBus) -> Self {
        Self {
            provider,
            slot: Arc::new(RwLock::new(None)),
            interval,
            events,
            worker: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn latest(&self) -> Option<SystemStats> {
        *self.slot.read().await
    }

    pub async fn is_running(&self) -> bool {
        self.worker.lock().await.is_some()
    }

    /// Polls once right away, then every interval until stopped.
    pub async fn start(&self) -> Result<()> {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            bail!("vitals poller already running");
        }

        let cancel_token = CancellationToken::new();
        let this = self.clone();
        let token = cancel_token.clone();
        let handle = tokio::spawn(async move { this.poll_loop(token).await });

        *worker = Some((cancel_token, handle));
        log_info!("vitals poller started ({}ms)", self.interval.as_millis());
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        let Some((cancel_token, handle)) = self.worker.lock().await.take() else {
            return Ok(());
        };
        cancel_token.cancel();
        handle.await.context("vitals poller task failed to join")
    }

    async fn poll_loop(self, cancel_token: CancellationToken) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    log_info!("vitals poller shutting down");
                    break;
                }
                _ = ticker.tick() => self.poll_once().await,
            }
        }
    }

    async fn poll_once(&self) {
        match self.provider.get_vitals().await {
            Ok(stats) => {
                *self.slot.write().await = Some(stats);
                self.events.emit(RuntimeEvent::VitalsUpdated { stats });
            }
            Err(err) => log_warn!("vitals poll failed, keeping last reading: {err:#}"),
        }
    }
}
