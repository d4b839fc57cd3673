pub mod backend;
pub mod boot;
pub mod capabilities;
pub mod config;
pub mod events;
pub mod models;
pub mod observer;
pub mod request;
pub mod runtime;
pub mod session;
pub mod utils;
pub mod view;
pub mod vitals;

use std::path::Path;

use anyhow::Result;

pub use backend::{AssistantBackend, InMemoryBackend, PushChannel, StatsProvider};
pub use config::RuntimeConfig;
pub use events::{EventBus, RuntimeEvent};
pub use models::{InteractionLog, SystemStats, Token};
pub use runtime::{RuntimeSnapshot, ShellDeps, ShellRuntime};
pub use utils::logging::init_logging;

/// Builds and starts a runtime from an optional config file.
///
/// Must be called inside a tokio runtime.
pub async fn run(config_path: Option<&Path>, deps: ShellDeps) -> Result<ShellRuntime> {
    init_logging();

    let config = match config_path {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default().with_env_overrides(),
    };

    log::info!("Axis shell starting up...");

    let runtime = ShellRuntime::new(config, deps);
    runtime.start().await?;
    Ok(runtime)
}
