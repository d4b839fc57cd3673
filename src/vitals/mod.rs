pub mod poller;
pub mod sysinfo_stats;

pub use poller::VitalsPoller;
pub use sysinfo_stats::SysinfoStats;
