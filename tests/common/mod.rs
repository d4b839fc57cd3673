#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use axis_shell_lib::{
    backend::{AssistantBackend, InMemoryBackend, PushChannel, StatsProvider},
    capabilities::{AutoConfirm, ConfirmGate, Cue, CuePlayer, IdSource},
    events::EventBus,
    models::{InteractionLog, SystemStats},
    session::SessionLogStore,
    ShellDeps,
};
use tokio::sync::{broadcast, Notify};

pub const OBSERVER_CHANNEL: &str = "observer-event";

pub fn log(id: &str, session_id: &str) -> InteractionLog {
    InteractionLog {
        id: id.to_string(),
        session_id: session_id.to_string(),
        timestamp: 0,
        user_tokens: axis_shell_lib::models::tokenize_input(&format!("question {id}"), 0),
        ai_response: format!("answer {id}"),
        provider_used: "gpt".to_string(),
    }
}

/// Deterministic ids: `id-1`, `id-2`, ...
#[derive(Default)]
pub struct SeqIds {
    next: AtomicUsize,
}

impl IdSource for SeqIds {
    fn new_id(&self) -> String {
        format!("id-{}", self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[derive(Default)]
pub struct RecordingCues {
    pub played: Mutex<Vec<Cue>>,
    pub fail: AtomicBool,
}

impl RecordingCues {
    pub fn failing() -> Self {
        Self {
            played: Mutex::new(Vec::new()),
            fail: AtomicBool::new(true),
        }
    }

    pub fn count(&self, cue: Cue) -> usize {
        self.played.lock().unwrap().iter().filter(|c| **c == cue).count()
    }
}

impl CuePlayer for RecordingCues {
    fn play(&self, cue: Cue) -> Result<()> {
        self.played.lock().unwrap().push(cue);
        if self.fail.load(Ordering::SeqCst) {
            bail!("audio device unavailable");
        }
        Ok(())
    }
}

/// Wraps the in-memory backend with failure switches, fetch delays and an
/// optional gate that holds `ask` until released.
#[derive(Clone)]
pub struct ScriptedBackend {
    pub inner: InMemoryBackend,
    pub fail_ask: Arc<AtomicBool>,
    pub fail_fetch: Arc<AtomicBool>,
    pub fail_delete: Arc<AtomicBool>,
    pub ask_calls: Arc<AtomicUsize>,
    pub fetch_calls: Arc<AtomicUsize>,
    pub delete_calls: Arc<AtomicUsize>,
    fetch_delays: Arc<Mutex<VecDeque<Duration>>>,
    ask_gate: Arc<Mutex<Option<Arc<Notify>>>>,
}

impl ScriptedBackend {
    pub fn new(history: Vec<InteractionLog>) -> Self {
        Self {
            inner: InMemoryBackend::new().with_history(history),
            fail_ask: Arc::new(AtomicBool::new(false)),
            fail_fetch: Arc::new(AtomicBool::new(false)),
            fail_delete: Arc::new(AtomicBool::new(false)),
            ask_calls: Arc::new(AtomicUsize::new(0)),
            fetch_calls: Arc::new(AtomicUsize::new(0)),
            delete_calls: Arc::new(AtomicUsize::new(0)),
            fetch_delays: Arc::new(Mutex::new(VecDeque::new())),
            ask_gate: Arc::new(Mutex::new(None)),
        }
    }

    pub fn delay_next_fetch(&self, delay: Duration) {
        self.fetch_delays.lock().unwrap().push_back(delay);
    }

    /// Makes subsequent `ask` calls wait until the returned notify fires.
    pub fn hold_asks(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.ask_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn ask_calls(&self) -> usize {
        self.ask_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssistantBackend for ScriptedBackend {
    async fn ask(&self, input: &str, session_id: &str) -> Result<()> {
        self.ask_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.ask_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_ask.load(Ordering::SeqCst) {
            return Err(anyhow!("provider timeout"));
        }
        self.inner.ask(input, session_id).await
    }

    async fn fetch_history(&self) -> Result<Vec<InteractionLog>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            bail!("history unavailable");
        }
        let snapshot = self.inner.history();
        let delay = self.fetch_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(snapshot)
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            bail!("delete rejected");
        }
        self.inner.delete_session(session_id).await
    }
}

impl PushChannel for ScriptedBackend {
    fn subscribe(&self, channel: &str) -> Result<broadcast::Receiver<String>> {
        self.inner.subscribe(channel)
    }
}

/// Replays scripted vitals results in order, repeating the last one.
pub struct ScriptedStats {
    script: Mutex<VecDeque<Result<SystemStats, String>>>,
    pub calls: AtomicUsize,
}

impl ScriptedStats {
    pub fn new(script: Vec<Result<SystemStats, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatsProvider for ScriptedStats {
    async fn get_vitals(&self) -> Result<SystemStats> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        match next {
            Some(Ok(stats)) => Ok(stats),
            Some(Err(message)) => Err(anyhow!(message)),
            None => bail!("no vitals scripted"),
        }
    }
}

pub fn stats(cpu: u8) -> SystemStats {
    SystemStats {
        cpu_usage: cpu,
        memory_used: 4 << 30,
        memory_total: 16 << 30,
        battery_level: 100,
        is_charging: true,
    }
}

pub fn store_with(
    backend: &ScriptedBackend,
    confirm: impl ConfirmGate + 'static,
) -> SessionLogStore {
    SessionLogStore::new(
        Arc::new(backend.clone()),
        Arc::new(confirm),
        Arc::new(SeqIds::default()),
        EventBus::new(64),
    )
}

pub fn store(backend: &ScriptedBackend) -> SessionLogStore {
    store_with(backend, AutoConfirm(true))
}

pub fn deps(backend: &ScriptedBackend, stats: Arc<ScriptedStats>, cues: Arc<RecordingCues>) -> ShellDeps {
    ShellDeps {
        backend: Arc::new(backend.clone()),
        push: Arc::new(backend.clone()),
        stats,
        confirm: Arc::new(AutoConfirm(true)),
        cues,
        ids: Arc::new(SeqIds::default()),
    }
}

/// Lets spawned tasks run to quiescence. Under a paused clock the runtime
/// only advances time once every ready task has run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
