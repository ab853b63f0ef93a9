//! @ai:module:intent Configuration structs and whole-config validation for the benchmark
//! @ai:module:layer infrastructure
//! @ai:module:public_api BenchmarkConfig, GeneralConfig, TranslatorConfig, TestInputConfig, TestSuiteConfig
//! @ai:module:stateless true

use crate::corpus::{Format, InputLoader};
use crate::error::ConfigError;
use crate::process::{CommandLine, InputMode, OutputMode};
use crate::solver::{ClassifierRegistry, Solver};
use crate::toolchain::ToolchainValidator;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// @ai:intent Main configuration for the benchmark system
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub translators: Vec<TranslatorConfig>,
    #[serde(default)]
    pub test_inputs: Vec<TestInputConfig>,
    #[serde(default)]
    pub test_suites: Vec<TestSuiteConfig>,
}

/// @ai:intent Session-wide options
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Base path; report extensions are appended
    #[serde(default = "default_result_path")]
    pub result_path: PathBuf,
    #[serde(default = "default_true")]
    pub result_as_json: bool,
    #[serde(default = "default_true")]
    pub result_as_csv: bool,
    #[serde(default = "default_true")]
    pub result_as_markdown: bool,
    /// Seconds per run
    #[serde(default = "default_test_timeout")]
    pub test_timeout: u64,
    /// Seconds per translation
    #[serde(default = "default_translation_timeout")]
    pub translation_timeout: u64,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_working_directory")]
    pub working_directory: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_bytes: Option<usize>,
}

/// @ai:intent External command converting inputs from one format to another
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslatorConfig {
    pub from_format: Format,
    pub to_format: Format,
    pub command: CommandLine,
    pub input_mode: InputMode,
    pub output_mode: OutputMode,
    /// Extension of cached translation files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

/// @ai:intent Named group of input files sharing one format
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestInputConfig {
    pub name: String,
    pub format: Format,
    pub patterns: Vec<String>,
}

/// @ai:intent One benchmarked solver invocation
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestSuiteConfig {
    pub name: String,
    pub command: CommandLine,
    pub required_format: Format,
    pub input_mode: InputMode,
    /// Defaults to the executable's basename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<Solver>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default = "default_true")]
    pub save_stdout: bool,
    #[serde(default = "default_true")]
    pub save_stderr: bool,
    /// Prepended to PATH for this suite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_inputs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_inputs: Option<Vec<String>>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            result_path: default_result_path(),
            result_as_json: true,
            result_as_csv: true,
            result_as_markdown: true,
            test_timeout: default_test_timeout(),
            translation_timeout: default_translation_timeout(),
            cache_dir: default_cache_dir(),
            working_directory: default_working_directory(),
            max_output_bytes: None,
        }
    }
}

fn default_result_path() -> PathBuf {
    PathBuf::from("results/benchmark")
}

fn default_true() -> bool {
    true
}

fn default_test_timeout() -> u64 {
    300
}

fn default_translation_timeout() -> u64 {
    600
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".cache")
}

fn default_working_directory() -> PathBuf {
    PathBuf::from(".")
}

impl GeneralConfig {
    pub fn test_timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout)
    }

    pub fn translation_timeout(&self) -> Duration {
        Duration::from_secs(self.translation_timeout)
    }

    /// @ai:intent Resolve a path against the working directory
    /// @ai:effects pure
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_directory.join(path)
        }
    }
}

impl TestSuiteConfig {
    /// @ai:intent Solver identity, explicit or derived from the executable
    /// @ai:effects pure
    pub fn resolved_solver(&self) -> Option<Solver> {
        self.solver
            .or_else(|| self.command.program().and_then(Solver::from_executable))
    }

    /// @ai:intent Whether this suite runs on the named test input
    /// @ai:effects pure
    pub fn accepts_input(&self, input_name: &str) -> bool {
        if let Some(include) = &self.include_inputs {
            return include.iter().any(|n| n == input_name);
        }
        if let Some(exclude) = &self.exclude_inputs {
            return !exclude.iter().any(|n| n == input_name);
        }
        true
    }
}

impl BenchmarkConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// @ai:intent Template configuration written by `init`
    /// @ai:effects pure
    pub fn example() -> Self {
        Self {
            general: GeneralConfig::default(),
            translators: vec![TranslatorConfig {
                from_format: Format::Tptp,
                to_format: Format::Ladr,
                command: CommandLine::parse("tptp_to_ladr"),
                input_mode: InputMode::Stdin,
                output_mode: OutputMode::Stdout,
                extension: Some("in".to_string()),
            }],
            test_inputs: vec![TestInputConfig {
                name: "tptp-sample".to_string(),
                format: Format::Tptp,
                patterns: vec!["inputs/**/*.p".to_string()],
            }],
            test_suites: vec![
                TestSuiteConfig {
                    name: "prover9".to_string(),
                    command: CommandLine::parse("prover9 -f $INPUT_PATH"),
                    required_format: Format::Ladr,
                    input_mode: InputMode::Argument,
                    solver: Some(Solver::Prover9),
                    version: Some("2009-11A".to_string()),
                    save_stdout: true,
                    save_stderr: true,
                    search_path: None,
                    include_inputs: None,
                    exclude_inputs: None,
                },
                TestSuiteConfig {
                    name: "spass".to_string(),
                    command: CommandLine::parse("SPASS -TPTP -TimeLimit=300 $INPUT_PATH"),
                    required_format: Format::Tptp,
                    input_mode: InputMode::Argument,
                    solver: Some(Solver::Spass),
                    version: Some("3.9".to_string()),
                    save_stdout: true,
                    save_stderr: true,
                    search_path: None,
                    include_inputs: None,
                    exclude_inputs: None,
                },
            ],
        }
    }

    /// @ai:intent Suite search path resolved against the working directory
    /// @ai:effects pure
    pub fn suite_search_path(&self, suite: &TestSuiteConfig) -> Option<PathBuf> {
        suite
            .search_path
            .as_deref()
            .map(|path| self.general.resolve(path))
    }

    /// @ai:intent Translator converting `from` into `to`, if configured
    /// @ai:effects pure
    pub fn find_translator(&self, from: Format, to: Format) -> Option<&TranslatorConfig> {
        self.translators
            .iter()
            .find(|t| t.from_format == from && t.to_format == to)
    }

    /// @ai:intent Keep only the named suites
    /// @ai:effects pure
    pub fn retain_suites(&mut self, names: &[String]) {
        if !names.is_empty() {
            self.test_suites.retain(|s| names.contains(&s.name));
        }
    }

    /// @ai:intent Collect every configuration problem
    /// @ai:effects fs:read
    pub fn validate(&self, registry: &ClassifierRegistry) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.general.test_timeout == 0 {
            errors.push(ConfigError::ZeroTimeout {
                field: "test_timeout",
            });
        }
        if self.general.translation_timeout == 0 {
            errors.push(ConfigError::ZeroTimeout {
                field: "translation_timeout",
            });
        }

        for (i, translator) in self.translators.iter().enumerate() {
            let field = format!("translators[{}]", i);
            Self::check_command(&translator.command, None, &field, &mut errors);
            errors.extend(translator.command.check_input_mode(translator.input_mode, &field).err());
            errors.extend(translator.command.check_output_mode(translator.output_mode, &field).err());
        }

        let mut input_names = HashSet::new();
        for (i, input) in self.test_inputs.iter().enumerate() {
            let field = format!("test_inputs[{}]", i);
            if !input_names.insert(input.name.as_str()) {
                errors.push(ConfigError::DuplicateName {
                    kind: "test input",
                    name: input.name.clone(),
                });
            }
            if let Err(pattern_errors) =
                InputLoader::expand_all(&input.patterns, &self.general.working_directory, &field)
            {
                errors.extend(pattern_errors);
            }
        }

        let mut suite_names = HashSet::new();
        for (i, suite) in self.test_suites.iter().enumerate() {
            let field = format!("test_suites[{}]", i);
            if !suite_names.insert(suite.name.as_str()) {
                errors.push(ConfigError::DuplicateName {
                    kind: "test suite",
                    name: suite.name.clone(),
                });
            }

            let search_path = self.suite_search_path(suite);
            Self::check_command(&suite.command, search_path.as_deref(), &field, &mut errors);
            errors.extend(suite.command.check_input_mode(suite.input_mode, &field).err());
            self.check_solver(suite, registry, &field, &mut errors);
            self.check_input_filters(suite, &input_names, &field, &mut errors);

            for input in self.test_inputs.iter().filter(|t| suite.accepts_input(&t.name)) {
                if input.format != suite.required_format
                    && self.find_translator(input.format, suite.required_format).is_none()
                {
                    errors.push(ConfigError::NoTranslationPath {
                        suite: suite.name.clone(),
                        input: input.name.clone(),
                        from: input.format.to_string(),
                        to: suite.required_format.to_string(),
                    });
                }
            }
        }

        errors
    }

    fn check_command(
        command: &CommandLine,
        search_path: Option<&Path>,
        field: &str,
        errors: &mut Vec<ConfigError>,
    ) {
        match command.program() {
            None => errors.push(ConfigError::EmptyCommand {
                field: field.to_string(),
            }),
            Some(program) => {
                if ToolchainValidator::resolve(program, search_path).is_none() {
                    errors.push(ConfigError::CommandNotFound {
                        field: field.to_string(),
                        program: program.to_string(),
                    });
                }
            }
        }
    }

    fn check_solver(
        &self,
        suite: &TestSuiteConfig,
        registry: &ClassifierRegistry,
        field: &str,
        errors: &mut Vec<ConfigError>,
    ) {
        let supported = registry
            .supported()
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        match suite.resolved_solver() {
            Some(solver) if registry.supports(solver) => {}
            Some(solver) => errors.push(ConfigError::UnsupportedSolver {
                field: field.to_string(),
                solver: solver.to_string(),
                supported,
            }),
            None => errors.push(ConfigError::UnsupportedSolver {
                field: field.to_string(),
                solver: suite
                    .command
                    .executable_name()
                    .unwrap_or_default(),
                supported,
            }),
        }
    }

    fn check_input_filters(
        &self,
        suite: &TestSuiteConfig,
        input_names: &HashSet<&str>,
        field: &str,
        errors: &mut Vec<ConfigError>,
    ) {
        if suite.include_inputs.is_some() && suite.exclude_inputs.is_some() {
            errors.push(ConfigError::ConflictingInputFilters {
                field: field.to_string(),
            });
        }
        let named = suite
            .include_inputs
            .iter()
            .chain(suite.exclude_inputs.iter())
            .flatten();
        for name in named {
            if !input_names.contains(name.as_str()) {
                errors.push(ConfigError::UnknownInput {
                    field: field.to_string(),
                    name: name.clone(),
                });
            }
        }
    }
}
