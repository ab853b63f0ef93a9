//! @ai:module:intent Result record types for benchmark runs
//! @ai:module:layer domain
//! @ai:module:public_api ExecutionStatistics, OutputCapture, InputDescriptor, TranslationProvenance, RunRecord, Report, HardwareInfo
//! @ai:module:stateless true

use crate::corpus::Format;
use crate::solver::Verdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use sysinfo::System;

/// @ai:intent Resource usage of one process, sampled while it runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStatistics {
    /// Wall-clock seconds from launch to exit (or to the latest poll while running)
    pub execution_time: f64,
    pub cpu_time: Option<f64>,
    /// Bytes; never decreases across samples
    pub peak_memory: Option<u64>,
    pub disk_reads: Option<u64>,
    pub disk_writes: Option<u64>,
    pub return_code: Option<i32>,
}

impl ExecutionStatistics {
    /// @ai:intent Ratchet the peak memory upward
    /// @ai:post peak_memory >= previous peak_memory
    /// @ai:effects pure
    pub fn record_memory(&mut self, current: u64) {
        self.peak_memory = Some(self.peak_memory.map_or(current, |peak| peak.max(current)));
    }
}

/// @ai:intent Captured output text of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputCapture {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    #[serde(default)]
    pub stdout_truncated: bool,
    #[serde(default)]
    pub stderr_truncated: bool,
}

/// @ai:intent Which translator produced the benchmarked file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationProvenance {
    pub command: String,
    pub from_format: Format,
    pub to_format: Format,
    pub source_path: PathBuf,
    pub cached: bool,
}

/// @ai:intent Identity of the input file a run was given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDescriptor {
    /// Test input group name
    pub name: String,
    /// File actually handed to the solver
    pub path: PathBuf,
    pub format: Format,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_with: Option<TranslationProvenance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula_statistics: Option<serde_json::Value>,
}

/// @ai:intent Immutable result of one (test suite, input file) execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub suite: String,
    pub program_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_version: Option<String>,
    pub command: String,
    pub input: InputDescriptor,
    pub statistics: ExecutionStatistics,
    pub output: OutputCapture,
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// @ai:intent Host snapshot taken once per session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub kernel_version: Option<String>,
    pub host_name: Option<String>,
    pub cpu_brand: Option<String>,
    pub cpu_frequency_mhz: Option<u64>,
    pub logical_cores: usize,
    pub physical_cores: usize,
    pub total_memory: u64,
}

impl HardwareInfo {
    /// @ai:intent Describe the machine the benchmark runs on
    /// @ai:effects io
    pub fn capture() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu();
        sys.refresh_memory();

        let cpu = sys.cpus().first();
        Self {
            os_name: System::name(),
            os_version: System::os_version(),
            kernel_version: System::kernel_version(),
            host_name: System::host_name(),
            cpu_brand: cpu.map(|c| c.brand().trim().to_string()),
            cpu_frequency_mhz: cpu.map(|c| c.frequency()),
            logical_cores: num_cpus::get(),
            physical_cores: num_cpus::get_physical(),
            total_memory: sys.total_memory(),
        }
    }
}

/// @ai:intent Ordered run records plus the host snapshot of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub date: DateTime<Utc>,
    pub hardware: HardwareInfo,
    pub runs: Vec<RunRecord>,
}

impl Report {
    /// @ai:intent Start an empty report stamped with the current time
    /// @ai:effects io
    pub fn new(hardware: HardwareInfo) -> Self {
        Self {
            date: Utc::now(),
            hardware,
            runs: Vec::new(),
        }
    }

    /// @ai:effects pure
    pub fn push(&mut self, record: RunRecord) {
        self.runs.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_memory_only_ratchets_up() {
        let mut stats = ExecutionStatistics::default();
        let samples = [10_u64, 40, 25, 40, 90, 5];
        let mut previous = 0;
        for sample in samples {
            stats.record_memory(sample);
            let peak = stats.peak_memory.unwrap();
            assert!(peak >= previous);
            previous = peak;
        }
        assert_eq!(stats.peak_memory, Some(90));
    }

    #[test]
    fn test_hardware_capture_counts_cores() {
        let info = HardwareInfo::capture();
        assert!(info.logical_cores >= 1);
        assert!(info.physical_cores >= 1);
    }

    #[test]
    fn test_report_keeps_insertion_order() {
        let mut report = Report::new(HardwareInfo::default());
        for name in ["a", "b", "c"] {
            report.push(RunRecord {
                suite: name.to_string(),
                program_name: "prover9".to_string(),
                program_version: None,
                command: "prover9".to_string(),
                input: InputDescriptor {
                    name: "in".to_string(),
                    path: PathBuf::from("x.in"),
                    format: Format::Ladr,
                    translated_with: None,
                    formula_statistics: None,
                },
                statistics: ExecutionStatistics::default(),
                output: OutputCapture::default(),
                verdict: Verdict::Unknown,
                error: None,
            });
        }
        let suites: Vec<_> = report.runs.iter().map(|r| r.suite.as_str()).collect();
        assert_eq!(suites, vec!["a", "b", "c"]);
    }
}
