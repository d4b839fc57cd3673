use anyhow::Result;
use async_trait::async_trait;
use sysinfo::System;
use tokio::sync::Mutex;

use crate::{backend::StatsProvider, models::SystemStats};

/// Host vitals via `sysinfo`. Battery is reported as a desktop on mains power.
pub struct SysinfoStats {
    system: Mutex<System>,
}

impl SysinfoStats {
    pub fn new() -> Self {
        let mut system = System::new();

        // CPU usage is a delta between refreshes; take the baseline now.
        system.refresh_cpu_usage();
        system.refresh_memory();

        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SysinfoStats {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatsProvider for SysinfoStats {
    async fn get_vitals(&self) -> Result<SystemStats> {
        let mut system = self.system.lock().await;
        system.refresh_cpu_usage();
        system.refresh_memory();

        let cpus = system.cpus();
        let cpu_avg = if cpus.is_empty() {
            0.0
        } else {
            cpus.iter().map(|cpu| cpu.cpu_usage()).sum::<f32>() / cpus.len() as f32
        };

        Ok(SystemStats {
            cpu_usage: cpu_avg.clamp(0.0, 100.0).round() as u8,
            memory_used: system.used_memory(),
            memory_total: system.total_memory(),
            battery_level: 100,
            is_charging: true,
        })
    }
}
