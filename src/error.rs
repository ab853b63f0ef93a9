//! @ai:module:intent Error taxonomy for configuration, launch and translation failures
//! @ai:module:layer domain
//! @ai:module:public_api ConfigError, LaunchError, RunError, TranslationError
//! @ai:module:stateless true

use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Problems detected before a run starts
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field}: command is empty")]
    EmptyCommand { field: String },

    #[error("{field}: command `{program}` was not found")]
    CommandNotFound { field: String, program: String },

    #[error("{field}: input_mode \"stdin\" cannot be used with $INPUT_PATH in command `{command}`")]
    StdinWithInputPlaceholder { field: String, command: String },

    #[error("{field}: input_mode \"argument\" requires $INPUT_PATH in command `{command}`")]
    ArgumentWithoutInputPlaceholder { field: String, command: String },

    #[error("{field}: output_mode \"stdout\" cannot be used with $OUTPUT_PATH in command `{command}`")]
    StdoutWithOutputPlaceholder { field: String, command: String },

    #[error("{field}: output_mode \"argument\" requires $OUTPUT_PATH in command `{command}`")]
    ArgumentWithoutOutputPlaceholder { field: String, command: String },

    #[error("{field}: solver `{solver}` is not supported (supported: {supported})")]
    UnsupportedSolver {
        field: String,
        solver: String,
        supported: String,
    },

    #[error("{field}: pattern `{pattern}` did not match any files")]
    PatternMatchedNothing { field: String, pattern: String },

    #[error("{field}: invalid pattern `{pattern}`: {message}")]
    InvalidPattern {
        field: String,
        pattern: String,
        message: String,
    },

    #[error("duplicate {kind} name `{name}`")]
    DuplicateName { kind: &'static str, name: String },

    #[error("{field}: include_inputs and exclude_inputs are mutually exclusive")]
    ConflictingInputFilters { field: String },

    #[error("{field}: unknown test input `{name}`")]
    UnknownInput { field: String, name: String },

    #[error("no translator from {from} to {to} for input `{input}` in suite `{suite}`")]
    NoTranslationPath {
        suite: String,
        input: String,
        from: String,
        to: String,
    },

    #[error("general.{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("cannot open input {}: {source}", path.display())]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// @ai:intent Failure to start an external process
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("command is empty")]
    EmptyCommand,

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("child process has no {0} pipe")]
    MissingPipe(&'static str),
}

/// @ai:intent Failure of a single supervised run before it produced an outcome
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

/// @ai:intent Failure to translate an input file into another format
#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("no translator from {from} to {to}")]
    NoTranslator { from: String, to: String },

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("translation I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("translation `{command}` did not finish within {seconds}s")]
    TimedOut { command: String, seconds: u64 },

    #[error("translation `{command}` failed with return code {return_code:?}: {stderr}")]
    Failed {
        command: String,
        return_code: Option<i32>,
        stderr: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages_name_the_field() {
        let err = ConfigError::StdinWithInputPlaceholder {
            field: "test_suites[0]".to_string(),
            command: "prover9 -f $INPUT_PATH".to_string(),
        };
        let message = err.to_string();
        assert!(message.starts_with("test_suites[0]:"));
        assert!(message.contains("$INPUT_PATH"));
    }

    #[test]
    fn test_run_error_is_transparent() {
        let err: RunError = LaunchError::EmptyCommand.into();
        assert_eq!(err.to_string(), "command is empty");
    }
}
