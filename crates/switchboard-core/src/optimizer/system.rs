//! Static machine capabilities

use serde::{Deserialize, Serialize};
use std::process::Command;
use sysinfo::System;
use tracing::debug;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Below this much RAM the machine is treated as memory constrained
pub const LOW_MEMORY_MB: u64 = 16 * 1024;

/// At or above this much RAM (with enough cores) the machine is high end
pub const HIGH_END_MEMORY_MB: u64 = 32 * 1024;

/// Cores needed to count as high end
pub const HIGH_END_CORES: u32 = 8;

/// CPU, memory and GPU availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemCapabilities {
    /// Logical CPUs
    pub cpu_cores: u32,
    /// Physical memory
    pub total_memory_mb: u64,
    /// Whether GPU acceleration is available
    pub gpu_available: bool,
}

impl SystemCapabilities {
    /// Explicit capabilities
    #[must_use]
    pub fn new(cpu_cores: u32, total_memory_mb: u64, gpu_available: bool) -> Self {
        Self {
            cpu_cores: cpu_cores.max(1),
            total_memory_mb,
            gpu_available,
        }
    }

    /// Probe the current machine
    #[must_use]
    pub fn detect() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_all();

        let cpu_cores = match sys.cpus().len() {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        };
        let capabilities = Self::new(
            u32::try_from(cpu_cores).unwrap_or(u32::MAX),
            sys.total_memory() / BYTES_PER_MB,
            detect_gpu(),
        );
        debug!(?capabilities, "Detected system capabilities");
        capabilities
    }

    /// Less than 16 GB of RAM
    #[must_use]
    pub fn is_low_memory(&self) -> bool {
        self.total_memory_mb < LOW_MEMORY_MB
    }

    /// Many cores and ample memory
    #[must_use]
    pub fn is_high_end(&self) -> bool {
        self.cpu_cores >= HIGH_END_CORES && self.total_memory_mb >= HIGH_END_MEMORY_MB
    }
}

/// Apple Silicon always has Metal; elsewhere look for a working `nvidia-smi`.
fn detect_gpu() -> bool {
    if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
        return true;
    }
    Command::new("nvidia-smi")
        .arg("--list-gpus")
        .output()
        .map(|output| output.status.success() && !output.stdout.is_empty())
        .unwrap_or(false)
}
