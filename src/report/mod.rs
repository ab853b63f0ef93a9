//! @ai:module:intent Report generation for benchmark results
//! @ai:module:layer infrastructure
//! @ai:module:public_api ReportGenerator, JsonReporter, CsvReporter, MarkdownReporter

pub mod csv_report;
pub mod json_report;
pub mod markdown_report;

pub use csv_report::{CsvReporter, CsvReporterTrait};
pub use json_report::{JsonReporter, JsonReporterTrait};
pub use markdown_report::{MarkdownReporter, MarkdownReporterTrait};

use crate::metrics::Report;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// @ai:intent Which report formats to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportFormats {
    pub json: bool,
    pub csv: bool,
    pub markdown: bool,
}

impl Default for ReportFormats {
    fn default() -> Self {
        Self {
            json: true,
            csv: true,
            markdown: true,
        }
    }
}

/// @ai:intent Combined report generator
pub struct ReportGenerator {
    json: JsonReporter,
    csv: CsvReporter,
    markdown: MarkdownReporter,
}

impl ReportGenerator {
    /// @ai:intent Create a new report generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            json: JsonReporter::new(),
            csv: CsvReporter::new(),
            markdown: MarkdownReporter::new(),
        }
    }

    /// @ai:intent `<base>.<extension>`, keeping any dots already in the base name
    /// @ai:effects pure
    fn with_extension(base: &Path, extension: &str) -> PathBuf {
        let mut path = base.as_os_str().to_os_string();
        path.push(".");
        path.push(extension);
        PathBuf::from(path)
    }

    /// @ai:intent Write every enabled report next to `base_path`
    /// @ai:effects fs:write
    pub fn generate_all(
        &self,
        report: &Report,
        base_path: &Path,
        formats: ReportFormats,
    ) -> Result<Vec<PathBuf>> {
        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut written = Vec::new();
        if formats.json {
            let path = Self::with_extension(base_path, "json");
            self.json.generate(report, &path)?;
            written.push(path);
        }
        if formats.csv {
            let path = Self::with_extension(base_path, "csv");
            self.csv.generate(report, &path)?;
            written.push(path);
        }
        if formats.markdown {
            let path = Self::with_extension(base_path, "md");
            self.markdown.generate(report, &path)?;
            written.push(path);
        }

        for path in &written {
            tracing::info!("Report written to {}", path.display());
        }
        Ok(written)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::HardwareInfo;
    use tempfile::TempDir;

    #[test]
    fn test_generate_all_respects_formats() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("results/run-2026.10");
        let report = Report::new(HardwareInfo::default());

        let written = ReportGenerator::new()
            .generate_all(
                &report,
                &base,
                ReportFormats {
                    csv: false,
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(written.len(), 2);
        assert!(temp.path().join("results/run-2026.10.json").exists());
        assert!(temp.path().join("results/run-2026.10.md").exists());
        assert!(!temp.path().join("results/run-2026.10.csv").exists());
    }
}
