//! @ai:module:intent Resolve solver and translator executables before a benchmark session
//! @ai:module:layer infrastructure
//! @ai:module:public_api ToolchainValidator, ToolchainStatus, MissingTool, prefixed_path
//! @ai:module:stateless true

use crate::config::BenchmarkConfig;
use crate::process::CommandLine;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// @ai:intent Status of toolchain validation
#[derive(Debug, Default)]
pub struct ToolchainStatus {
    pub available_tools: Vec<AvailableTool>,
    pub missing_tools: Vec<MissingTool>,
}

/// @ai:intent An executable that was found
#[derive(Debug)]
pub struct AvailableTool {
    pub used_by: String,
    pub path: PathBuf,
}

/// @ai:intent Information about a missing tool
#[derive(Debug)]
pub struct MissingTool {
    pub used_by: String,
    pub tool_name: String,
    pub install_hint: &'static str,
}

impl ToolchainStatus {
    pub fn is_complete(&self) -> bool {
        self.missing_tools.is_empty()
    }
}

/// @ai:intent Validates that configured executables are installed
pub struct ToolchainValidator;

impl ToolchainValidator {
    /// @ai:intent Get install hint for a tool
    /// @ai:effects pure
    fn get_install_hint(tool: &str) -> &'static str {
        match tool.to_lowercase().as_str() {
            "prover9" | "tptp_to_ladr" | "ladr_to_tptp" => {
                "Install LADR/Prover9: https://www.cs.unm.edu/~mccune/prover9/"
            }
            "spass" | "dfg2otter" | "tptp2dfg" => {
                "Install SPASS: https://www.mpi-inf.mpg.de/departments/automation-of-logic/software/spass-workbench/"
            }
            _ => "Check tool documentation for installation instructions",
        }
    }

    /// @ai:intent Locate `program` the way the child process would see it
    /// @ai:effects fs:read
    ///
    /// Programs containing a path separator are taken relative to the current
    /// directory; bare names are searched in `search_path` first, then `PATH`.
    pub fn resolve(program: &str, search_path: Option<&Path>) -> Option<PathBuf> {
        let candidate = Path::new(program);
        if candidate.components().count() > 1 {
            return is_executable(candidate).then(|| candidate.to_path_buf());
        }

        let mut directories: Vec<PathBuf> = search_path.map(Path::to_path_buf).into_iter().collect();
        if let Some(path) = std::env::var_os("PATH") {
            directories.extend(std::env::split_paths(&path));
        }

        directories
            .into_iter()
            .flat_map(|dir| executable_candidates(&dir, program))
            .find(|path| is_executable(path))
    }

    /// @ai:intent Resolve the program of a command line
    /// @ai:effects fs:read
    pub fn resolve_command(command: &CommandLine, search_path: Option<&Path>) -> Option<PathBuf> {
        command
            .program()
            .and_then(|program| Self::resolve(program, search_path))
    }

    /// @ai:intent Check every translator and test suite executable
    /// @ai:effects fs:read
    pub fn validate(config: &BenchmarkConfig) -> ToolchainStatus {
        let mut status = ToolchainStatus::default();

        let translators = config.translators.iter().map(|t| {
            (
                format!("translator {}->{}", t.from_format, t.to_format),
                &t.command,
                None,
            )
        });
        let suites = config.test_suites.iter().map(|s| {
            (
                format!("test suite {}", s.name),
                &s.command,
                config.suite_search_path(s),
            )
        });

        for (used_by, command, search_path) in translators.chain(suites) {
            let Some(program) = command.program() else {
                continue;
            };
            match Self::resolve(program, search_path.as_deref()) {
                Some(path) => status.available_tools.push(AvailableTool { used_by, path }),
                None => status.missing_tools.push(MissingTool {
                    used_by,
                    tool_name: program.to_string(),
                    install_hint: Self::get_install_hint(
                        command.executable_name().as_deref().unwrap_or(program),
                    ),
                }),
            }
        }

        status
    }

    /// @ai:intent Log warnings for missing tools
    /// @ai:effects io
    pub fn log_warnings(status: &ToolchainStatus) {
        for missing in &status.missing_tools {
            tracing::warn!(
                "Tool '{}' not found - {} cannot run. {}",
                missing.tool_name,
                missing.used_by,
                missing.install_hint
            );
        }
    }
}

/// @ai:intent PATH value with `search_path` prepended, for a child environment
/// @ai:effects pure
pub fn prefixed_path(search_path: &Path) -> Option<OsString> {
    let mut directories = vec![search_path.to_path_buf()];
    if let Some(path) = std::env::var_os("PATH") {
        directories.extend(std::env::split_paths(&path));
    }
    std::env::join_paths(directories).ok()
}

fn executable_candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    let mut candidates = vec![dir.join(program)];
    if cfg!(windows) && Path::new(program).extension().is_none() {
        candidates.push(dir.join(format!("{}.exe", program)));
    }
    candidates
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
