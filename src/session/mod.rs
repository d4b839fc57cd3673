pub mod store;
pub mod view;

pub use store::{DeleteOutcome, ReloadOutcome, SessionLogStore};
pub use view::{list_sessions, logs_for, summarize_sessions, SessionSummary};
