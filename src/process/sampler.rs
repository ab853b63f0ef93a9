//! @ai:module:intent Resource sampling capability for running child processes
//! @ai:module:layer infrastructure
//! @ai:module:public_api ResourceSampler, SysinfoSampler, UnavailableSampler, IoCounters, default_sampler
//! @ai:module:stateless false

use std::time::Instant;
use sysinfo::{Pid, System};

/// @ai:intent Cumulative disk I/O of a process, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoCounters {
    pub read_bytes: u64,
    pub written_bytes: u64,
}

/// @ai:intent Per-platform process introspection; every capability may be absent
pub trait ResourceSampler: Send {
    /// Refresh cached data for `pid`; false if the process is gone
    fn refresh(&mut self, pid: u32) -> bool;

    /// Resident memory in bytes
    fn sample_memory(&self, pid: u32) -> Option<u64>;

    /// Accumulated CPU seconds
    fn sample_cpu_time(&self, pid: u32) -> Option<f64>;

    fn sample_io(&self, pid: u32) -> Option<IoCounters>;

    /// System-wide available memory in bytes
    fn available_system_memory(&mut self) -> Option<u64>;
}

/// @ai:intent Sampler backed by the sysinfo crate
///
/// sysinfo reports CPU usage as a percentage since the previous refresh, so CPU
/// time is integrated over the refresh intervals and is approximate.
pub struct SysinfoSampler {
    system: System,
    tracked: Option<u32>,
    cpu_seconds: f64,
    last_refresh: Option<Instant>,
}

impl SysinfoSampler {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            tracked: None,
            cpu_seconds: 0.0,
            last_refresh: None,
        }
    }

    fn process(&self, pid: u32) -> Option<&sysinfo::Process> {
        self.system.process(Pid::from_u32(pid))
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceSampler for SysinfoSampler {
    /// @ai:effects io
    fn refresh(&mut self, pid: u32) -> bool {
        if self.tracked != Some(pid) {
            self.tracked = Some(pid);
            self.cpu_seconds = 0.0;
            self.last_refresh = None;
        }

        let now = Instant::now();
        if !self.system.refresh_process(Pid::from_u32(pid)) {
            return false;
        }

        if let Some(previous) = self.last_refresh {
            let usage = self.process(pid).map(|p| p.cpu_usage()).unwrap_or(0.0);
            let elapsed = now.duration_since(previous).as_secs_f64();
            self.cpu_seconds += f64::from(usage) / 100.0 * elapsed;
        }
        self.last_refresh = Some(now);
        true
    }

    fn sample_memory(&self, pid: u32) -> Option<u64> {
        self.process(pid).map(|p| p.memory())
    }

    fn sample_cpu_time(&self, pid: u32) -> Option<f64> {
        if self.tracked == Some(pid) && self.last_refresh.is_some() {
            Some(self.cpu_seconds)
        } else {
            None
        }
    }

    fn sample_io(&self, pid: u32) -> Option<IoCounters> {
        self.process(pid).map(|p| {
            let usage = p.disk_usage();
            IoCounters {
                read_bytes: usage.total_read_bytes,
                written_bytes: usage.total_written_bytes,
            }
        })
    }

    /// @ai:effects io
    fn available_system_memory(&mut self) -> Option<u64> {
        self.system.refresh_memory();
        Some(self.system.available_memory())
    }
}

/// @ai:intent Fallback for platforms without process introspection
#[derive(Debug, Default)]
pub struct UnavailableSampler;

impl ResourceSampler for UnavailableSampler {
    fn refresh(&mut self, _pid: u32) -> bool {
        true
    }

    fn sample_memory(&self, _pid: u32) -> Option<u64> {
        None
    }

    fn sample_cpu_time(&self, _pid: u32) -> Option<f64> {
        None
    }

    fn sample_io(&self, _pid: u32) -> Option<IoCounters> {
        None
    }

    fn available_system_memory(&mut self) -> Option<u64> {
        None
    }
}

/// @ai:intent Best sampler for the current platform
/// @ai:effects pure
pub fn default_sampler() -> Box<dyn ResourceSampler> {
    if sysinfo::IS_SUPPORTED_SYSTEM {
        Box::new(SysinfoSampler::new())
    } else {
        Box::new(UnavailableSampler)
    }
}
