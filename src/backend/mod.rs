mod memory;

pub use memory::InMemoryBackend;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::models::{InteractionLog, SystemStats};

/// Request/response half of the assistant backend.
///
/// `ask` produces its logs as a side effect; callers observe them only through
/// the next `fetch_history` snapshot.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn ask(&self, input: &str, session_id: &str) -> Result<()>;

    /// Full authoritative history in chronological order.
    async fn fetch_history(&self) -> Result<Vec<InteractionLog>>;

    async fn delete_session(&self, session_id: &str) -> Result<()>;
}

#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn get_vitals(&self) -> Result<SystemStats>;
}

/// Backend-to-front event stream. Dropping the receiver is the unsubscribe.
pub trait PushChannel: Send + Sync {
    fn subscribe(&self, channel: &str) -> Result<broadcast::Receiver<String>>;
}
