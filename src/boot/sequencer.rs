use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use chrono::{DateTime, Local};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    capabilities::{Cue, CuePlayer},
    config::RuntimeConfig,
    events::{EventBus, RuntimeEvent},
    view::ViewModeController,
};

use super::{render_boot_steps, BootAdvance, BootState, BootStep, RenderedBootStep};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, Default)]
struct BootRun {
    state: BootState,
    started_at: Option<DateTime<Local>>,
}

/// Drives the boot script on a fixed tick and hands over to the chat view.
#[derive(Clone)]
pub struct BootSequencer {
    steps: Arc<Vec<BootStep>>,
    run: Arc<Mutex<BootRun>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    step_interval: Duration,
    completion_delay: Duration,
    cues: Arc<dyn CuePlayer>,
    view: ViewModeController,
    events: EventBus,
}

impl BootSequencer {
    pub fn new(
        config: &RuntimeConfig,
        cues: Arc<dyn CuePlayer>,
        view: ViewModeController,
        events: EventBus,
    ) -> Self {
        Self {
            steps: Arc::new(config.boot_steps.clone()),
            run: Arc::new(Mutex::new(BootRun::default())),
            ticker: Arc::new(Mutex::new(None)),
            step_interval: config.boot_step_interval(),
            completion_delay: config.boot_completion_delay(),
            cues,
            view,
            events,
        }
    }

    pub fn steps(&self) -> &[BootStep] {
        &self.steps
    }

    pub async fn state(&self) -> BootState {
        self.run.lock().await.state
    }

    pub async fn render(&self) -> Vec<RenderedBootStep> {
        let run = *self.run.lock().await;
        render_boot_steps(
            &self.steps,
            &run.state,
            run.started_at.unwrap_or_else(Local::now),
            self.step_interval,
        )
    }

    pub async fn start(&self) -> Result<()> {
        let mut ticker_guard = self.ticker.lock().await;
        if ticker_guard.is_some() {
            bail!("boot sequence already started");
        }

        self.run.lock().await.started_at = Some(Local::now());
        log_info!(
            "Boot sequence started: {} steps every {}ms",
            self.steps.len(),
            self.step_interval.as_millis()
        );

        let this = self.clone();
        *ticker_guard = Some(tokio::spawn(async move { this.tick_loop().await }));
        Ok(())
    }

    /// Stops future ticks. A pending chat hand-over is dropped with them.
    pub async fn stop(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    async fn tick_loop(self) {
        let mut ticker = time::interval_at(Instant::now() + self.step_interval, self.step_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let outcome = self.run.lock().await.state.advance(self.steps.len());
            match outcome {
                BootAdvance::Stepped(cursor) => {
                    self.play(Cue::BootStep);
                    self.events.emit(RuntimeEvent::BootAdvanced { cursor });
                }
                BootAdvance::Completed => {
                    log_info!("Boot sequence completed");
                    self.play(Cue::BootComplete);
                    self.events.emit(RuntimeEvent::BootCompleted);
                    break;
                }
                BootAdvance::Finished => return,
            }
        }

        time::sleep(self.completion_delay).await;
        self.view.enter_chat();
    }

    fn play(&self, cue: Cue) {
        if let Err(err) = self.cues.play(cue) {
            log_warn!("cue {:?} failed: {err}", cue);
        }
    }
}
