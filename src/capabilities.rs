//! Host capabilities the runtime consumes but does not implement: the
//! confirmation dialog, the id generator and the cue-sound player.

use anyhow::Result;
use log::debug;
use uuid::Uuid;

/// Synchronous yes/no gate shown before destructive actions.
pub trait ConfirmGate: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt the same way. Useful for headless hosts.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl ConfirmGate for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

pub trait IdSource: Send + Sync {
    fn new_id(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdSource;

impl IdSource for UuidIdSource {
    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    BootStep,
    BootComplete,
}

/// Fire-and-forget sound cues. Errors are reported back only so callers can
/// log them; they never change runtime state.
pub trait CuePlayer: Send + Sync {
    fn play(&self, cue: Cue) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogCuePlayer;

impl CuePlayer for LogCuePlayer {
    fn play(&self, cue: Cue) -> Result<()> {
        debug!("cue {:?}", cue);
        Ok(())
    }
}
