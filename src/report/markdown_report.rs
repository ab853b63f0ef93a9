//! @ai:module:intent Markdown report generation
//! @ai:module:layer infrastructure
//! @ai:module:public_api MarkdownReporter
//! @ai:module:stateless true

use crate::metrics::{MetricsAggregator, MetricsAggregatorTrait, Report, SessionSummary};
use crate::solver::Verdict;
use anyhow::{Context, Result};
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// @ai:intent Trait for Markdown report generation
pub trait MarkdownReporterTrait: Send + Sync {
    /// @ai:intent Generate Markdown report from results
    fn generate(&self, report: &Report, output_path: &Path) -> Result<()>;
}

/// @ai:intent Generates Markdown reports from benchmark results
pub struct MarkdownReporter {
    aggregator: MetricsAggregator,
}

impl MarkdownReporter {
    /// @ai:intent Create a new Markdown reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            aggregator: MetricsAggregator::new(),
        }
    }

    /// @ai:intent Human-readable byte count
    /// @ai:effects pure
    fn format_bytes(bytes: u64) -> String {
        const MIB: f64 = 1024.0 * 1024.0;
        if bytes as f64 >= MIB {
            format!("{:.1} MiB", bytes as f64 / MIB)
        } else {
            format!("{:.1} KiB", bytes as f64 / 1024.0)
        }
    }

    /// @ai:intent Generate header with date and hardware
    /// @ai:effects pure
    fn generate_summary(report: &Report) -> String {
        let mut output = String::new();
        let hw = &report.hardware;

        writeln!(output, "# Theorem Prover Benchmark Results").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "**Date:** {}", report.date.to_rfc3339()).unwrap();
        writeln!(output, "**Runs:** {}", report.runs.len()).unwrap();
        writeln!(output).unwrap();
        writeln!(output, "## Hardware").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "- **OS:** {} {} (kernel {})",
            hw.os_name.as_deref().unwrap_or("unknown"),
            hw.os_version.as_deref().unwrap_or(""),
            hw.kernel_version.as_deref().unwrap_or("unknown")
        )
        .unwrap();
        writeln!(
            output,
            "- **CPU:** {} ({} MHz, {} physical / {} logical cores)",
            hw.cpu_brand.as_deref().unwrap_or("unknown"),
            hw.cpu_frequency_mhz.unwrap_or(0),
            hw.physical_cores,
            hw.logical_cores
        )
        .unwrap();
        writeln!(output, "- **Memory:** {}", Self::format_bytes(hw.total_memory)).unwrap();
        writeln!(output).unwrap();

        output
    }

    /// @ai:intent Generate verdict count table
    /// @ai:effects pure
    fn generate_verdict_section(summary: &SessionSummary) -> String {
        let mut output = String::new();

        writeln!(output, "## Verdicts").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "| Verdict | Runs |").unwrap();
        writeln!(output, "|---------|------|").unwrap();
        for verdict in Verdict::ALL {
            writeln!(output, "| {} | {} |", verdict, summary.counts.get(verdict)).unwrap();
        }
        writeln!(output).unwrap();

        output
    }

    /// @ai:intent Generate per-suite table
    /// @ai:effects pure
    fn generate_suite_section(summary: &SessionSummary) -> String {
        let mut output = String::new();

        writeln!(output, "## By Test Suite").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "| Suite | Program | Runs | SAT | UNSAT | Timeout | OOM | Error | Unknown | Solved | Avg Time (s) | Max Memory |"
        )
        .unwrap();
        writeln!(
            output,
            "|-------|---------|------|-----|-------|---------|-----|-------|---------|--------|--------------|------------|"
        )
        .unwrap();

        for suite in &summary.suites {
            writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {:.1}% | {:.3} | {} |",
                suite.suite,
                suite.program_name,
                suite.runs,
                suite.counts.satisfiable,
                suite.counts.unsatisfiable,
                suite.counts.timeout,
                suite.counts.out_of_memory,
                suite.counts.error,
                suite.counts.unknown,
                suite.solved_rate,
                suite.avg_execution_time,
                suite
                    .max_peak_memory
                    .map(Self::format_bytes)
                    .unwrap_or_else(|| "-".to_string())
            )
            .unwrap();
        }
        writeln!(output).unwrap();

        output
    }

    /// @ai:intent Generate the list of failed runs with their error messages
    /// @ai:effects pure
    fn generate_error_section(report: &Report) -> String {
        let mut output = String::new();
        let failed: Vec<_> = report.runs.iter().filter(|r| r.error.is_some()).collect();
        if failed.is_empty() {
            return output;
        }

        writeln!(output, "## Errors").unwrap();
        writeln!(output).unwrap();
        for run in failed {
            writeln!(
                output,
                "- `{}` on `{}`: {}",
                run.suite,
                run.input.path.display(),
                run.error.as_deref().unwrap_or_default()
            )
            .unwrap();
        }
        writeln!(output).unwrap();

        output
    }

    /// @ai:intent Render the full Markdown document
    /// @ai:effects pure
    pub fn render(&self, report: &Report) -> String {
        let summary = self.aggregator.summarize(&report.runs);
        let mut output = Self::generate_summary(report);
        output.push_str(&Self::generate_verdict_section(&summary));
        output.push_str(&Self::generate_suite_section(&summary));
        output.push_str(&Self::generate_error_section(report));
        output
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownReporterTrait for MarkdownReporter {
    /// @ai:intent Generate Markdown report to file
    /// @ai:effects fs:write
    fn generate(&self, report: &Report, output_path: &Path) -> Result<()> {
        std::fs::write(output_path, self.render(report))
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Format;
    use crate::metrics::{ExecutionStatistics, HardwareInfo, InputDescriptor, OutputCapture, RunRecord};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn record(suite: &str, verdict: Verdict, error: Option<&str>) -> RunRecord {
        RunRecord {
            suite: suite.to_string(),
            program_name: suite.to_string(),
            program_version: None,
            command: suite.to_string(),
            input: InputDescriptor {
                name: "sample".to_string(),
                path: PathBuf::from("p.in"),
                format: Format::Ladr,
                translated_with: None,
                formula_statistics: None,
            },
            statistics: ExecutionStatistics {
                execution_time: 2.0,
                peak_memory: Some(3 * 1024 * 1024),
                ..Default::default()
            },
            output: OutputCapture::default(),
            verdict,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(MarkdownReporter::format_bytes(2048), "2.0 KiB");
        assert_eq!(MarkdownReporter::format_bytes(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn test_generate_markdown_report() {
        let mut report = Report::new(HardwareInfo::default());
        report.push(record("prover9", Verdict::Satisfiable, None));
        report.push(record("prover9", Verdict::Timeout, None));
        report.push(record("spass", Verdict::Error, Some("failed to spawn `SPASS`")));

        let temp = TempDir::new().unwrap();
        let output = temp.path().join("results.md");
        MarkdownReporter::new().generate(&report, &output).unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("# Theorem Prover Benchmark Results"));
        assert!(content.contains("| TIMEOUT | 1 |"));
        assert!(content.contains("| prover9 | prover9 | 2 | 1 | 0 | 1 | 0 | 0 | 0 | 50.0% | 2.000 | 3.0 MiB |"));
        assert!(content.contains("## Errors"));
        assert!(content.contains("failed to spawn `SPASS`"));
    }
}
