pub mod interaction;
pub mod vitals;

pub use interaction::{tokenize_input, InteractionLog, ObserverNotice, Token, OBSERVER_PROVIDER};
pub use vitals::SystemStats;
