//! @ai:module:intent Benchmark session execution: suite x input x file iteration and RunRecord assembly
//! @ai:module:layer application
//! @ai:module:public_api BenchmarkExecutor, InputFile
//! @ai:module:stateless false

use crate::config::{BenchmarkConfig, TestSuiteConfig};
use crate::corpus::{Format, FormatTranslator, InputLoader, TranslationCache};
use crate::error::{ConfigError, TranslationError};
use crate::metrics::{ExecutionStatistics, InputDescriptor, OutputCapture, RunRecord, TranslationProvenance};
use crate::process::{CaptureMode, InputMode, ProcessSupervisor, RunRequest, RunState};
use crate::solver::Verdict;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// @ai:intent One concrete file of a named test input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub input_name: String,
    pub format: Format,
    pub path: PathBuf,
}

/// @ai:intent Runs every configured suite on every accepted input file, one process at a time
pub struct BenchmarkExecutor {
    config: BenchmarkConfig,
    supervisor: ProcessSupervisor,
    translator: FormatTranslator,
    cancel: Arc<AtomicBool>,
}

impl BenchmarkExecutor {
    /// @ai:intent Create an executor from a validated configuration
    /// @ai:pre config.validate(..) returned no errors
    /// @ai:effects pure
    pub fn new(config: BenchmarkConfig, supervisor: ProcessSupervisor) -> Self {
        let cache = TranslationCache::new(config.general.resolve(&config.general.cache_dir));
        let translator = FormatTranslator::new(cache, config.general.translation_timeout());
        Self {
            config,
            supervisor,
            translator,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// @ai:intent Share an externally owned cancellation flag
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// @ai:intent Expand every test input into its files
    /// @ai:effects fs:read
    pub fn collect_inputs(&self) -> Result<Vec<InputFile>, Vec<ConfigError>> {
        let mut files = Vec::new();
        let mut errors = Vec::new();

        for (i, input) in self.config.test_inputs.iter().enumerate() {
            let field = format!("test_inputs[{}]", i);
            match InputLoader::expand_all(
                &input.patterns,
                &self.config.general.working_directory,
                &field,
            ) {
                Ok(paths) => files.extend(paths.into_iter().map(|path| InputFile {
                    input_name: input.name.clone(),
                    format: input.format,
                    path,
                })),
                Err(e) => errors.extend(e),
            }
        }

        if errors.is_empty() {
            Ok(files)
        } else {
            Err(errors)
        }
    }

    /// @ai:intent Run every (suite, accepted file) pair in configuration order
    /// @ai:post one RunRecord per executed pair; stops scheduling once cancelled
    /// @ai:effects io
    pub async fn execute_all(&self, files: &[InputFile]) -> Vec<RunRecord> {
        let mut records = Vec::new();

        'suites: for suite in &self.config.test_suites {
            for file in files.iter().filter(|f| suite.accepts_input(&f.input_name)) {
                if self.is_cancelled() {
                    tracing::warn!("Benchmark interrupted, no further runs scheduled");
                    break 'suites;
                }
                records.push(self.execute_one(suite, file).await);
            }
        }

        records
    }

    /// @ai:intent Translate if needed, run the suite on one file and assemble its RunRecord
    /// @ai:effects io
    pub async fn execute_one(&self, suite: &TestSuiteConfig, file: &InputFile) -> RunRecord {
        let formula_statistics = InputLoader::load_formula_statistics(&file.path);
        let mut input = InputDescriptor {
            name: file.input_name.clone(),
            path: file.path.clone(),
            format: file.format,
            translated_with: None,
            formula_statistics,
        };

        if file.format != suite.required_format {
            match self.translate(file, suite.required_format).await {
                Ok((path, provenance)) => {
                    input.path = path;
                    input.format = suite.required_format;
                    input.translated_with = Some(provenance);
                }
                Err(e) => {
                    tracing::warn!(
                        "Translation of {} for suite '{}' failed: {}",
                        file.path.display(),
                        suite.name,
                        e
                    );
                    return Self::error_record(suite, input, e.to_string());
                }
            }
        }

        tracing::info!(
            "Running suite '{}' on {} ({})",
            suite.name,
            input.path.display(),
            suite.command
        );

        let capture = CaptureMode::from_limit(self.config.general.max_output_bytes);
        let search_path = self.config.suite_search_path(suite);
        let request = RunRequest {
            command: &suite.command,
            input_path: &input.path,
            input_mode: suite.input_mode,
            timeout: self.config.general.test_timeout(),
            stdout_capture: capture,
            stderr_capture: capture,
            search_path: search_path.as_deref(),
            solver: suite.resolved_solver(),
            cancel: Some(&self.cancel),
        };

        match self.supervisor.run(request).await {
            Ok(outcome) => {
                tracing::info!(
                    "Suite '{}' on {}: {} (return code {:?}, {:.2}s)",
                    suite.name,
                    input.path.display(),
                    outcome.verdict,
                    outcome.statistics.return_code,
                    outcome.statistics.execution_time
                );
                let mut output = outcome.output;
                if !suite.save_stdout {
                    output.stdout = None;
                    output.stdout_truncated = false;
                }
                if !suite.save_stderr {
                    output.stderr = None;
                    output.stderr_truncated = false;
                }
                RunRecord {
                    suite: suite.name.clone(),
                    program_name: program_name(suite),
                    program_version: suite.version.clone(),
                    command: outcome.command.to_string(),
                    input,
                    statistics: outcome.statistics,
                    output,
                    verdict: outcome.verdict,
                    error: (outcome.state == RunState::Interrupted)
                        .then(|| "interrupted".to_string()),
                }
            }
            Err(e) => {
                tracing::error!("Suite '{}' on {} failed: {}", suite.name, input.path.display(), e);
                Self::error_record(suite, input, e.to_string())
            }
        }
    }

    async fn translate(
        &self,
        file: &InputFile,
        target: Format,
    ) -> Result<(PathBuf, TranslationProvenance), TranslationError> {
        let translator = self
            .config
            .find_translator(file.format, target)
            .ok_or_else(|| TranslationError::NoTranslator {
                from: file.format.to_string(),
                to: target.to_string(),
            })?;
        let translated = self.translator.translate(translator, &file.path).await?;
        Ok((translated.path, translated.provenance))
    }

    fn error_record(suite: &TestSuiteConfig, input: InputDescriptor, error: String) -> RunRecord {
        let command = match suite.input_mode {
            InputMode::Argument => suite.command.substitute(Some(&input.path), None),
            InputMode::Stdin => suite.command.clone(),
        };
        RunRecord {
            suite: suite.name.clone(),
            program_name: program_name(suite),
            program_version: suite.version.clone(),
            command: command.to_string(),
            input,
            statistics: ExecutionStatistics::default(),
            output: OutputCapture::default(),
            verdict: Verdict::Error,
            error: Some(error),
        }
    }
}

fn program_name(suite: &TestSuiteConfig) -> String {
    suite
        .command
        .executable_name()
        .unwrap_or_else(|| suite.name.clone())
}
