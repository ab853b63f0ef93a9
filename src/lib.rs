//! @ai:module:intent Theorem prover benchmark harness library
//! @ai:module:layer application
//! @ai:module:public_api config, corpus, process, solver, runner, metrics, report, toolchain

pub mod config;
pub mod corpus;
pub mod error;
pub mod metrics;
pub mod process;
pub mod report;
pub mod runner;
pub mod solver;
pub mod toolchain;

#[cfg(test)]
mod test_support;

pub use config::BenchmarkConfig;
pub use error::{ConfigError, LaunchError, RunError, TranslationError};
pub use metrics::{MetricsAggregator, Report, RunRecord};
pub use process::{MonitoredProcess, NonBlockingReader, ProcessSupervisor};
pub use report::ReportGenerator;
pub use runner::BenchmarkExecutor;
pub use solver::{ClassifierRegistry, OutputClassifier, Solver, Verdict};
pub use toolchain::{ToolchainStatus, ToolchainValidator};
