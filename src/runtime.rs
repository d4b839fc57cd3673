use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info};
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};

use crate::{
    backend::{AssistantBackend, InMemoryBackend, PushChannel, StatsProvider},
    boot::{BootSequencer, RenderedBootStep},
    capabilities::{AutoConfirm, ConfirmGate, CuePlayer, IdSource, LogCuePlayer, UuidIdSource},
    config::RuntimeConfig,
    events::{EventBus, RuntimeEvent},
    models::{InteractionLog, SystemStats},
    observer::EventInjector,
    request::{InputBuffer, KeyAction, KeyPress, RequestCoordinator},
    session::{self, SessionLogStore, SessionSummary},
    view::{ViewMode, ViewModeController},
    vitals::{SysinfoStats, VitalsPoller},
};

/// External services and host capabilities the runtime is built on.
pub struct ShellDeps {
    pub backend: Arc<dyn AssistantBackend>,
    pub push: Arc<dyn PushChannel>,
    pub stats: Arc<dyn StatsProvider>,
    pub confirm: Arc<dyn ConfirmGate>,
    pub cues: Arc<dyn CuePlayer>,
    pub ids: Arc<dyn IdSource>,
}

impl ShellDeps {
    /// Local wiring: in-process backend, host vitals, no dialogs, no sound.
    pub fn local(backend: InMemoryBackend) -> Self {
        let backend = Arc::new(backend);
        Self {
            backend: backend.clone(),
            push: backend,
            stats: Arc::new(SysinfoStats::new()),
            confirm: Arc::new(AutoConfirm(true)),
            cues: Arc::new(LogCuePlayer),
            ids: Arc::new(UuidIdSource),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSnapshot {
    pub view_mode: ViewMode,
    pub boot_steps: Vec<RenderedBootStep>,
    pub boot_completed: bool,
    pub sessions: Vec<SessionSummary>,
    pub active_session_id: String,
    pub transcript: Vec<InteractionLog>,
    pub is_submitting: bool,
    pub input: String,
    pub vitals: Option<SystemStats>,
}

/// The shell's runtime context. Every component hangs off one instance; there
/// is no global state, so independent runtimes can coexist.
#[derive(Clone)]
pub struct ShellRuntime {
    events: EventBus,
    view: ViewModeController,
    boot: BootSequencer,
    store: SessionLogStore,
    coordinator: RequestCoordinator,
    injector: EventInjector,
    vitals: VitalsPoller,
    handover: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ShellRuntime {
    pub fn new(config: RuntimeConfig, deps: ShellDeps) -> Self {
        let events = EventBus::new(config.event_buffer);
        let view = ViewModeController::new(events.clone());
        let boot = BootSequencer::new(&config, deps.cues, view.clone(), events.clone());
        let store = SessionLogStore::new(
            deps.backend.clone(),
            deps.confirm,
            deps.ids,
            events.clone(),
        );
        let coordinator = RequestCoordinator::new(
            store.clone(),
            deps.backend,
            InputBuffer::new(),
            events.clone(),
        );
        let injector = EventInjector::new(store.clone(), deps.push, config.observer_channel.clone());
        let vitals = VitalsPoller::new(deps.stats, config.vitals_interval(), events.clone());

        Self {
            events,
            view,
            boot,
            store,
            coordinator,
            injector,
            vitals,
            handover: Arc::new(Mutex::new(None)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &SessionLogStore {
        &self.store
    }

    pub fn coordinator(&self) -> &RequestCoordinator {
        &self.coordinator
    }

    pub fn input(&self) -> &InputBuffer {
        self.coordinator.input()
    }

    pub fn boot(&self) -> &BootSequencer {
        &self.boot
    }

    pub fn view(&self) -> &ViewModeController {
        &self.view
    }

    pub fn vitals(&self) -> &VitalsPoller {
        &self.vitals
    }

    /// Starts the boot sequence. Chat services come up once the view switches.
    pub async fn start(&self) -> Result<()> {
        self.boot.start().await.context("failed to start boot sequence")?;

        let this = self.clone();
        let handle = tokio::spawn(async move {
            this.view.wait_for_chat().await;
            this.enter_chat().await;
        });
        *self.handover.lock().await = Some(handle);
        info!("Axis shell runtime started");
        Ok(())
    }

    async fn enter_chat(&self) {
        self.store.load_history().await;
        if let Err(err) = self.injector.start().await {
            error!("Failed to start event injector: {err:#}");
        }
        if let Err(err) = self.vitals.start().await {
            error!("Failed to start vitals poller: {err:#}");
        }
    }

    /// Stops timers and listeners. In-flight backend calls are left to finish.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.handover.lock().await.take() {
            handle.abort();
        }
        self.boot.stop().await;
        if let Err(err) = self.injector.stop().await {
            error!("Event injector shutdown failed: {err:#}");
        }
        if let Err(err) = self.vitals.stop().await {
            error!("Vitals poller shutdown failed: {err:#}");
        }
        info!("Axis shell runtime stopped");
    }

    /// Routes a key press through the compose box and submits on Enter.
    pub async fn press_key(&self, press: KeyPress) -> KeyAction {
        let action = self.coordinator.input().handle_key(press);
        if action == KeyAction::Submit {
            self.coordinator.submit_input().await;
        }
        action
    }

    pub async fn snapshot(&self) -> RuntimeSnapshot {
        let boot_state = self.boot.state().await;
        let (logs, active_session_id) = self.store.read_state().await;

        RuntimeSnapshot {
            view_mode: self.view.mode(),
            boot_steps: self.boot.render().await,
            boot_completed: boot_state.completed,
            sessions: session::summarize_sessions(&logs, &active_session_id),
            transcript: session::logs_for(&logs, &active_session_id),
            active_session_id,
            is_submitting: self.coordinator.is_submitting(),
            input: self.coordinator.input().text(),
            vitals: self.vitals.latest().await,
        }
    }
}
