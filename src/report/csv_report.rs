//! @ai:module:intent CSV report generation, one flattened row per run
//! @ai:module:layer infrastructure
//! @ai:module:public_api CsvReporter
//! @ai:module:stateless true

use crate::metrics::{Report, RunRecord};
use anyhow::{Context, Result};
use std::fmt::Write as FmtWrite;
use std::path::Path;

const COLUMNS: &[&str] = &[
    "suite",
    "program_name",
    "program_version",
    "command",
    "input_name",
    "input_path",
    "input_format",
    "translated_from",
    "verdict",
    "return_code",
    "execution_time",
    "cpu_time",
    "peak_memory",
    "disk_reads",
    "disk_writes",
    "error",
];

/// @ai:intent Trait for CSV report generation
pub trait CsvReporterTrait: Send + Sync {
    /// @ai:intent Generate CSV report from results
    fn generate(&self, report: &Report, output_path: &Path) -> Result<()>;
}

/// @ai:intent Generates CSV reports; captured output is omitted
pub struct CsvReporter;

impl CsvReporter {
    /// @ai:intent Create a new CSV reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Quote a field when it contains a separator, quote or newline
    /// @ai:effects pure
    fn escape(field: &str) -> String {
        if field.contains([',', '"', '\n', '\r']) {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn optional<T: ToString>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    /// @ai:effects pure
    fn row(run: &RunRecord) -> Vec<String> {
        vec![
            run.suite.clone(),
            run.program_name.clone(),
            run.program_version.clone().unwrap_or_default(),
            run.command.clone(),
            run.input.name.clone(),
            run.input.path.display().to_string(),
            run.input.format.to_string(),
            Self::optional(
                run.input
                    .translated_with
                    .as_ref()
                    .map(|t| t.source_path.display()),
            ),
            run.verdict.to_string(),
            Self::optional(run.statistics.return_code),
            format!("{:.3}", run.statistics.execution_time),
            Self::optional(run.statistics.cpu_time.map(|t| format!("{:.3}", t))),
            Self::optional(run.statistics.peak_memory),
            Self::optional(run.statistics.disk_reads),
            Self::optional(run.statistics.disk_writes),
            run.error.clone().unwrap_or_default(),
        ]
    }

    /// @ai:intent Render the whole report as CSV text
    /// @ai:effects pure
    pub fn render(report: &Report) -> String {
        let mut output = String::new();
        writeln!(output, "{}", COLUMNS.join(",")).unwrap();
        for run in &report.runs {
            let fields: Vec<String> = Self::row(run).iter().map(|f| Self::escape(f)).collect();
            writeln!(output, "{}", fields.join(",")).unwrap();
        }
        output
    }
}

impl Default for CsvReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvReporterTrait for CsvReporter {
    /// @ai:intent Generate CSV report to file
    /// @ai:effects fs:write
    fn generate(&self, report: &Report, output_path: &Path) -> Result<()> {
        std::fs::write(output_path, Self::render(report))
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Format;
    use crate::metrics::{ExecutionStatistics, HardwareInfo, InputDescriptor, OutputCapture};
    use crate::solver::Verdict;
    use std::path::PathBuf;

    #[test]
    fn test_escape() {
        assert_eq!(CsvReporter::escape("plain"), "plain");
        assert_eq!(CsvReporter::escape("a,b"), "\"a,b\"");
        assert_eq!(CsvReporter::escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_render_omits_output_and_flattens_record() {
        let mut report = Report::new(HardwareInfo::default());
        report.push(RunRecord {
            suite: "prover9".to_string(),
            program_name: "prover9".to_string(),
            program_version: None,
            command: "prover9 -f a.in".to_string(),
            input: InputDescriptor {
                name: "sample".to_string(),
                path: PathBuf::from("a.in"),
                format: Format::Ladr,
                translated_with: None,
                formula_statistics: None,
            },
            statistics: ExecutionStatistics {
                execution_time: 1.5,
                return_code: Some(2),
                peak_memory: Some(1024),
                ..Default::default()
            },
            output: OutputCapture {
                stdout: Some("SEARCH FAILED, secret output".to_string()),
                ..Default::default()
            },
            verdict: Verdict::Unsatisfiable,
            error: None,
        });

        let csv = CsvReporter::render(&report);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split(',').count(), COLUMNS.len());
        assert_eq!(
            lines[1],
            "prover9,prover9,,prover9 -f a.in,sample,a.in,ladr,,UNSATISFIABLE,2,1.500,,1024,,,"
        );
        assert!(!csv.contains("secret"));
    }
}
