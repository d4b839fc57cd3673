use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemStats {
    /// Average across cores, 0-100.
    pub cpu_usage: u8,
    pub memory_used: u64,
    pub memory_total: u64,
    pub battery_level: u8,
    pub is_charging: bool,
}

impl SystemStats {
    pub fn memory_percent(&self) -> f64 {
        if self.memory_total == 0 {
            return 0.0;
        }
        self.memory_used as f64 / self.memory_total as f64 * 100.0
    }
}
