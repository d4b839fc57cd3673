pub mod coordinator;
pub mod input;

pub use coordinator::{RequestCoordinator, SubmitOutcome};
pub use input::{InputBuffer, Key, KeyAction, KeyPress};
