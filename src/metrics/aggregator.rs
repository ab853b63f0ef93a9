//! @ai:module:intent Per-verdict counts and per-suite summaries of run records
//! @ai:module:layer application
//! @ai:module:public_api MetricsAggregator, MetricsAggregatorTrait, VerdictCounts, SuiteSummary, SessionSummary
//! @ai:module:stateless true

use crate::metrics::types::RunRecord;
use crate::solver::Verdict;
use serde::{Deserialize, Serialize};

/// @ai:intent Number of runs per verdict
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub satisfiable: usize,
    pub unsatisfiable: usize,
    pub timeout: usize,
    pub out_of_memory: usize,
    pub error: usize,
    pub unknown: usize,
}

impl VerdictCounts {
    /// @ai:effects pure
    pub fn add(&mut self, verdict: Verdict) {
        *self.slot(verdict) += 1;
    }

    /// @ai:effects pure
    pub fn get(&self, verdict: Verdict) -> usize {
        match verdict {
            Verdict::Satisfiable => self.satisfiable,
            Verdict::Unsatisfiable => self.unsatisfiable,
            Verdict::Timeout => self.timeout,
            Verdict::OutOfMemory => self.out_of_memory,
            Verdict::Error => self.error,
            Verdict::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> usize {
        Verdict::ALL.iter().map(|v| self.get(*v)).sum()
    }

    pub fn solved(&self) -> usize {
        self.satisfiable + self.unsatisfiable
    }

    fn slot(&mut self, verdict: Verdict) -> &mut usize {
        match verdict {
            Verdict::Satisfiable => &mut self.satisfiable,
            Verdict::Unsatisfiable => &mut self.unsatisfiable,
            Verdict::Timeout => &mut self.timeout,
            Verdict::OutOfMemory => &mut self.out_of_memory,
            Verdict::Error => &mut self.error,
            Verdict::Unknown => &mut self.unknown,
        }
    }
}

impl std::fmt::Display for VerdictCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = Verdict::ALL
            .iter()
            .map(|v| format!("{}={}", v, self.get(*v)))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// @ai:intent Aggregate statistics of one test suite
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub suite: String,
    pub program_name: String,
    pub runs: usize,
    pub counts: VerdictCounts,
    pub solved_rate: f64,
    pub total_execution_time: f64,
    pub avg_execution_time: f64,
    /// Mean over solved runs only
    pub avg_solved_time: Option<f64>,
    pub max_peak_memory: Option<u64>,
}

/// @ai:intent Whole-session aggregate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_runs: usize,
    pub counts: VerdictCounts,
    pub suites: Vec<SuiteSummary>,
}

/// @ai:intent Trait for metrics aggregation
pub trait MetricsAggregatorTrait: Send + Sync {
    /// @ai:intent Summarize run records, suites in first-appearance order
    fn summarize(&self, runs: &[RunRecord]) -> SessionSummary;
}

/// @ai:intent Aggregates run records into statistical summaries
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// @ai:intent Create a new metrics aggregator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Calculate summary stats for one suite's records
    /// @ai:effects pure
    fn summarize_suite(suite: &str, runs: &[&RunRecord]) -> SuiteSummary {
        let mut counts = VerdictCounts::default();
        for run in runs {
            counts.add(run.verdict);
        }

        let times: Vec<f64> = runs.iter().map(|r| r.statistics.execution_time).collect();
        let solved_times: Vec<f64> = runs
            .iter()
            .filter(|r| r.verdict.is_solved())
            .map(|r| r.statistics.execution_time)
            .collect();

        let solved_rate = if runs.is_empty() {
            0.0
        } else {
            counts.solved() as f64 / runs.len() as f64 * 100.0
        };

        SuiteSummary {
            suite: suite.to_string(),
            program_name: runs
                .first()
                .map(|r| r.program_name.clone())
                .unwrap_or_default(),
            runs: runs.len(),
            counts,
            solved_rate,
            total_execution_time: times.iter().sum(),
            avg_execution_time: average(&times).unwrap_or(0.0),
            avg_solved_time: average(&solved_times),
            max_peak_memory: runs.iter().filter_map(|r| r.statistics.peak_memory).max(),
        }
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAggregatorTrait for MetricsAggregator {
    /// @ai:effects pure
    fn summarize(&self, runs: &[RunRecord]) -> SessionSummary {
        let mut counts = VerdictCounts::default();
        let mut suite_order: Vec<&str> = Vec::new();
        for run in runs {
            counts.add(run.verdict);
            if !suite_order.contains(&run.suite.as_str()) {
                suite_order.push(&run.suite);
            }
        }

        let suites = suite_order
            .into_iter()
            .map(|suite| {
                let suite_runs: Vec<&RunRecord> = runs.iter().filter(|r| r.suite == suite).collect();
                Self::summarize_suite(suite, &suite_runs)
            })
            .collect();

        SessionSummary {
            total_runs: runs.len(),
            counts,
            suites,
        }
    }
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Format;
    use crate::metrics::types::{ExecutionStatistics, InputDescriptor, OutputCapture};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn record(suite: &str, verdict: Verdict, time: f64, memory: Option<u64>) -> RunRecord {
        RunRecord {
            suite: suite.to_string(),
            program_name: suite.to_lowercase(),
            program_version: None,
            command: format!("{} in.p", suite),
            input: InputDescriptor {
                name: "inputs".to_string(),
                path: PathBuf::from("in.p"),
                format: Format::Tptp,
                translated_with: None,
                formula_statistics: None,
            },
            statistics: ExecutionStatistics {
                execution_time: time,
                peak_memory: memory,
                ..Default::default()
            },
            output: OutputCapture::default(),
            verdict,
            error: None,
        }
    }

    #[test]
    fn test_counts_cover_every_run() {
        let runs = vec![
            record("spass", Verdict::Satisfiable, 1.0, Some(10)),
            record("prover9", Verdict::Timeout, 300.0, Some(50)),
            record("spass", Verdict::Unsatisfiable, 3.0, None),
            record("spass", Verdict::Error, 0.1, Some(30)),
        ];
        let summary = MetricsAggregator::new().summarize(&runs);

        assert_eq!(summary.total_runs, 4);
        assert_eq!(summary.counts.total(), 4);
        assert_eq!(summary.counts.solved(), 2);
        assert_eq!(summary.counts.timeout, 1);
    }

    #[test]
    fn test_suite_summaries_in_first_appearance_order() {
        let runs = vec![
            record("spass", Verdict::Satisfiable, 1.0, Some(10)),
            record("prover9", Verdict::Timeout, 300.0, Some(50)),
            record("spass", Verdict::Unsatisfiable, 3.0, None),
            record("spass", Verdict::Error, 2.0, Some(30)),
        ];
        let summary = MetricsAggregator::new().summarize(&runs);

        let names: Vec<_> = summary.suites.iter().map(|s| s.suite.as_str()).collect();
        assert_eq!(names, vec!["spass", "prover9"]);

        let spass = &summary.suites[0];
        assert_eq!(spass.runs, 3);
        assert_eq!(spass.avg_execution_time, 2.0);
        assert_eq!(spass.avg_solved_time, Some(2.0));
        assert_eq!(spass.max_peak_memory, Some(30));
        assert!((spass.solved_rate - 66.666).abs() < 0.01);

        let prover9 = &summary.suites[1];
        assert_eq!(prover9.avg_solved_time, None);
        assert_eq!(prover9.solved_rate, 0.0);
    }

    #[test]
    fn test_empty_session() {
        let summary = MetricsAggregator::new().summarize(&[]);
        assert_eq!(summary, SessionSummary::default());
    }

    #[test]
    fn test_counts_display() {
        let mut counts = VerdictCounts::default();
        counts.add(Verdict::OutOfMemory);
        assert!(counts.to_string().contains("OUT_OF_MEMORY=1"));
        assert!(counts.to_string().contains("SATISFIABLE=0"));
    }
}
