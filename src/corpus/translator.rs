//! @ai:module:intent External format translation with an on-disk cache
//! @ai:module:layer infrastructure
//! @ai:module:public_api TranslationCache, FormatTranslator, TranslatedInput
//! @ai:module:stateless false

use crate::config::TranslatorConfig;
use crate::error::{LaunchError, TranslationError};
use crate::metrics::TranslationProvenance;
use crate::process::{InputMode, OutputMode};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// @ai:intent File produced by a translator, ready to be benchmarked
#[derive(Debug, Clone)]
pub struct TranslatedInput {
    pub path: PathBuf,
    pub provenance: TranslationProvenance,
}

/// @ai:intent Cache layout `<root>/<translator>/<from>-<to>/<hash of input path>[.ext]`
///
/// No locking: concurrent translations of the same input race and the last
/// writer wins.
#[derive(Debug, Clone)]
pub struct TranslationCache {
    root: PathBuf,
}

impl TranslationCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// @ai:intent Cache location for translating `input` with `translator`
    /// @ai:effects fs:read
    pub fn entry_path(&self, translator: &TranslatorConfig, input: &Path) -> PathBuf {
        let executable = translator
            .command
            .executable_name()
            .unwrap_or_else(|| "unknown".to_string());
        let absolute = std::fs::canonicalize(input).unwrap_or_else(|_| input.to_path_buf());

        let mut hasher = Sha256::new();
        hasher.update(absolute.to_string_lossy().as_bytes());
        let mut file_name = format!("{:x}", hasher.finalize());
        if let Some(extension) = &translator.extension {
            file_name.push('.');
            file_name.push_str(extension.trim_start_matches('.'));
        }

        self.root
            .join(executable)
            .join(format!("{}-{}", translator.from_format, translator.to_format))
            .join(file_name)
    }

    /// @ai:intent Whether a cache entry exists and is at least as new as its input
    /// @ai:effects fs:read
    pub fn is_fresh(entry: &Path, input: &Path) -> bool {
        let modified = |path: &Path| std::fs::metadata(path).and_then(|m| m.modified());
        match (modified(entry), modified(input)) {
            (Ok(entry_time), Ok(input_time)) => entry_time >= input_time,
            _ => false,
        }
    }
}

/// @ai:intent Runs translator commands, reusing cached results
pub struct FormatTranslator {
    cache: TranslationCache,
    timeout: Duration,
}

impl FormatTranslator {
    /// @ai:effects pure
    pub fn new(cache: TranslationCache, timeout: Duration) -> Self {
        Self { cache, timeout }
    }

    /// @ai:intent Translate `input`, or return the cached translation
    /// @ai:pre called from within a tokio runtime
    /// @ai:effects fs:write
    pub async fn translate(
        &self,
        translator: &TranslatorConfig,
        input: &Path,
    ) -> Result<TranslatedInput, TranslationError> {
        let output = self.cache.entry_path(translator, input);
        let provenance = |cached| TranslationProvenance {
            command: translator.command.to_string(),
            from_format: translator.from_format,
            to_format: translator.to_format,
            source_path: input.to_path_buf(),
            cached,
        };

        if TranslationCache::is_fresh(&output, input) {
            tracing::debug!("Using cached translation {}", output.display());
            return Ok(TranslatedInput {
                path: output,
                provenance: provenance(true),
            });
        }

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if let Err(e) = self.run_translator(translator, input, &output).await {
            let _ = std::fs::remove_file(&output);
            return Err(e);
        }

        tracing::info!(
            "Translated {} ({} -> {}) into {}",
            input.display(),
            translator.from_format,
            translator.to_format,
            output.display()
        );
        Ok(TranslatedInput {
            path: output,
            provenance: provenance(false),
        })
    }

    async fn run_translator(
        &self,
        translator: &TranslatorConfig,
        input: &Path,
        output: &Path,
    ) -> Result<(), TranslationError> {
        let command = translator.command.substitute(
            (translator.input_mode == InputMode::Argument).then_some(input),
            (translator.output_mode == OutputMode::Argument).then_some(output),
        );
        let program = command.program().ok_or(LaunchError::EmptyCommand)?;

        let stdin = match translator.input_mode {
            InputMode::Stdin => Stdio::from(std::fs::File::open(input)?),
            InputMode::Argument => Stdio::null(),
        };
        let stdout = match translator.output_mode {
            OutputMode::Stdout => Stdio::from(std::fs::File::create(output)?),
            OutputMode::Argument => Stdio::null(),
        };

        let child = Command::new(program)
            .args(command.args())
            .stdin(stdin)
            .stdout(stdout)
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: program.to_string(),
                source,
            })?;

        // Dropping the child on timeout kills it.
        let result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| TranslationError::TimedOut {
                command: command.to_string(),
                seconds: self.timeout.as_secs(),
            })??;

        if !result.status.success() {
            return Err(TranslationError::Failed {
                command: command.to_string(),
                return_code: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        if !output.is_file() {
            return Err(TranslationError::Failed {
                command: command.to_string(),
                return_code: result.status.code(),
                stderr: format!("no output written to {}", output.display()),
            });
        }
        Ok(())
    }
}
