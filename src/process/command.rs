//! @ai:module:intent Command-line tokens with path placeholders and input/output placement modes
//! @ai:module:layer domain
//! @ai:module:public_api CommandLine, InputMode, OutputMode, INPUT_PATH_PLACEHOLDER, OUTPUT_PATH_PLACEHOLDER
//! @ai:module:stateless true

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const INPUT_PATH_PLACEHOLDER: &str = "$INPUT_PATH";
pub const OUTPUT_PATH_PLACEHOLDER: &str = "$OUTPUT_PATH";

/// @ai:intent How the input file reaches the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// File contents are piped to standard input
    Stdin,
    /// File path replaces `$INPUT_PATH` in the command
    Argument,
}

/// @ai:intent Where a translator writes its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Stdout,
    Argument,
}

/// @ai:intent Ordered program + argument tokens, parsed from a whitespace separated string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CommandLine {
    tokens: Vec<String>,
}

impl CommandLine {
    /// @ai:intent Split a command string on whitespace
    /// @ai:effects pure
    pub fn parse(command: &str) -> Self {
        Self {
            tokens: command.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn program(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or(&[])
    }

    /// @ai:intent Lower-cased basename of the program, used as solver and cache identity
    /// @ai:effects pure
    pub fn executable_name(&self) -> Option<String> {
        let program = self.program()?;
        let name = Path::new(program).file_name()?.to_str()?;
        Some(name.to_lowercase())
    }

    /// @ai:effects pure
    pub fn contains_placeholder(&self, placeholder: &str) -> bool {
        self.tokens.iter().any(|t| t.contains(placeholder))
    }

    /// @ai:intent Replace placeholders by concrete paths; `None` leaves the placeholder untouched
    /// @ai:effects pure
    pub fn substitute(&self, input: Option<&Path>, output: Option<&Path>) -> Self {
        let tokens = self
            .tokens
            .iter()
            .map(|token| {
                let mut token = token.clone();
                if let Some(path) = input {
                    token = token.replace(INPUT_PATH_PLACEHOLDER, &path.to_string_lossy());
                }
                if let Some(path) = output {
                    token = token.replace(OUTPUT_PATH_PLACEHOLDER, &path.to_string_lossy());
                }
                token
            })
            .collect();
        Self { tokens }
    }

    /// @ai:intent Check that the input placement mode agrees with the `$INPUT_PATH` placeholder
    /// @ai:effects pure
    pub fn check_input_mode(&self, mode: InputMode, field: &str) -> Result<(), ConfigError> {
        let has_placeholder = self.contains_placeholder(INPUT_PATH_PLACEHOLDER);
        match (mode, has_placeholder) {
            (InputMode::Stdin, true) => Err(ConfigError::StdinWithInputPlaceholder {
                field: field.to_string(),
                command: self.to_string(),
            }),
            (InputMode::Argument, false) => Err(ConfigError::ArgumentWithoutInputPlaceholder {
                field: field.to_string(),
                command: self.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// @ai:intent Check that the output placement mode agrees with the `$OUTPUT_PATH` placeholder
    /// @ai:effects pure
    pub fn check_output_mode(&self, mode: OutputMode, field: &str) -> Result<(), ConfigError> {
        let has_placeholder = self.contains_placeholder(OUTPUT_PATH_PLACEHOLDER);
        match (mode, has_placeholder) {
            (OutputMode::Stdout, true) => Err(ConfigError::StdoutWithOutputPlaceholder {
                field: field.to_string(),
                command: self.to_string(),
            }),
            (OutputMode::Argument, false) => Err(ConfigError::ArgumentWithoutOutputPlaceholder {
                field: field.to_string(),
                command: self.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

impl From<String> for CommandLine {
    fn from(command: String) -> Self {
        Self::parse(&command)
    }
}

impl From<&str> for CommandLine {
    fn from(command: &str) -> Self {
        Self::parse(command)
    }
}

impl From<CommandLine> for String {
    fn from(command: CommandLine) -> Self {
        command.to_string()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}
