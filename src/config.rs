use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::boot::BootStep;

const FAST_BOOT_ENV: &str = "AXIS_FAST_BOOT";
const FAST_BOOT_DIVISOR: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    pub boot_step_interval_ms: u64,
    pub boot_completion_delay_ms: u64,
    pub vitals_interval_ms: u64,
    pub observer_channel: String,
    pub event_buffer: usize,
    pub boot_steps: Vec<BootStep>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            boot_step_interval_ms: 600,
            boot_completion_delay_ms: 1500,
            vitals_interval_ms: 2000,
            observer_channel: "observer-event".into(),
            event_buffer: 64,
            boot_steps: default_boot_steps(),
        }
    }
}

impl RuntimeConfig {
    /// Reads the config file and applies environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::read(path)?.with_env_overrides())
    }

    /// Reads a JSON config file. A missing file yields the defaults and a
    /// malformed one is logged and replaced by them.
    pub fn read(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed config {}: {err}", path.display());
                Self::default()
            })
        } else {
            Self::default()
        };

        Ok(config)
    }

    pub fn with_env_overrides(self) -> Self {
        let fast_boot = std::env::var(FAST_BOOT_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if fast_boot {
            self.accelerated(FAST_BOOT_DIVISOR)
        } else {
            self
        }
    }

    pub fn accelerated(mut self, divisor: u64) -> Self {
        let divisor = divisor.max(1);
        self.boot_step_interval_ms = (self.boot_step_interval_ms / divisor).max(1);
        self.boot_completion_delay_ms /= divisor;
        self.vitals_interval_ms = (self.vitals_interval_ms / divisor).max(1);
        self
    }

    pub fn boot_step_interval(&self) -> Duration {
        Duration::from_millis(self.boot_step_interval_ms.max(1))
    }

    pub fn boot_completion_delay(&self) -> Duration {
        Duration::from_millis(self.boot_completion_delay_ms)
    }

    pub fn vitals_interval(&self) -> Duration {
        Duration::from_millis(self.vitals_interval_ms.max(1))
    }
}

pub fn default_boot_steps() -> Vec<BootStep> {
    [
        ("Power-on self test", Some("CPU / memory check")),
        ("Loading Axis kernel", None),
        ("Mounting memory store", Some("history.json")),
        ("Starting observer daemon", None),
        ("Linking model providers", Some("gpt / gemini / grok / llama")),
        ("Calibrating vitals monitor", None),
        ("Restoring session history", None),
        ("Axis shell ready", None),
    ]
    .into_iter()
    .enumerate()
    .map(|(index, (label, detail))| BootStep {
        id: index as u32 + 1,
        label: label.to_string(),
        detail: detail.map(str::to_string),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RuntimeConfig::read(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.boot_steps.len(), 8);
        assert_eq!(config.observer_channel, "observer-event");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"vitals_interval_ms": 5000, "observer_channel": "axis-observer-event"}}"#)
            .unwrap();

        let config = RuntimeConfig::read(file.path()).unwrap();
        assert_eq!(config.vitals_interval_ms, 5000);
        assert_eq!(config.observer_channel, "axis-observer-event");
        assert_eq!(config.boot_steps, default_boot_steps());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let config = RuntimeConfig::read(file.path()).unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn accelerated_divides_every_interval() {
        let config = RuntimeConfig::default().accelerated(10);
        assert_eq!(config.boot_step_interval_ms, 60);
        assert_eq!(config.boot_completion_delay_ms, 150);
        assert_eq!(config.vitals_interval_ms, 200);
    }

    #[test]
    fn default_steps_are_numbered_from_one() {
        let ids: Vec<_> = default_boot_steps().iter().map(|s| s.id).collect();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    }
}
