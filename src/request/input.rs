use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
}

impl KeyPress {
    pub fn enter() -> Self {
        Self {
            key: Key::Enter,
            shift: false,
        }
    }

    pub fn shift_enter() -> Self {
        Self {
            key: Key::Enter,
            shift: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Submit,
    InsertNewline,
    /// Let the key through untouched (typing, or committing an IME candidate).
    Passthrough,
}

#[derive(Debug, Default)]
struct InputState {
    text: String,
    composing: bool,
}

/// Compose box contents plus the IME composition flag.
#[derive(Clone, Default)]
pub struct InputBuffer {
    inner: Arc<Mutex<InputState>>,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.lock().text.clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.lock().text = text.into();
    }

    pub fn clear(&self) {
        self.lock().text.clear();
    }

    pub fn is_composing(&self) -> bool {
        self.lock().composing
    }

    pub fn begin_composition(&self) {
        self.lock().composing = true;
    }

    pub fn end_composition(&self) {
        self.lock().composing = false;
    }

    /// Shift+Enter always breaks the line; plain Enter submits unless an IME
    /// composition is in progress.
    pub fn handle_key(&self, press: KeyPress) -> KeyAction {
        let mut state = self.lock();
        match press.key {
            Key::Enter if press.shift => {
                state.text.push('\n');
                KeyAction::InsertNewline
            }
            Key::Enter if state.composing => KeyAction::Passthrough,
            Key::Enter => KeyAction::Submit,
            Key::Other => KeyAction::Passthrough,
        }
    }

    fn lock(&self) -> MutexGuard<'_, InputState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
