//! Shell command model used by verification directives
//!
//! A command in the input JSON may be a plain string (run through the
//! shell), an argv array, or a full object carrying environment variables
//! and a working directory. All three forms round-trip unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The command itself: one shell line or an argv vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCommand {
    Line(String),
    Argv(Vec<String>),
}

impl RawCommand {
    /// Human-readable form for log messages.
    pub fn display(&self) -> String {
        match self {
            RawCommand::Line(line) => line.clone(),
            RawCommand::Argv(argv) => argv
                .iter()
                .map(|a| shell_escape::escape(a.as_str().into()).into_owned())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// A command plus its execution environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellCommand {
    pub command: RawCommand,

    /// Extra environment variables for the child process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,

    /// Working directory of the child process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl ShellCommand {
    pub fn line(command: impl Into<String>) -> Self {
        ShellCommand {
            command: RawCommand::Line(command.into()),
            env: None,
            cwd: None,
        }
    }

    pub fn argv(argv: Vec<String>) -> Self {
        ShellCommand {
            command: RawCommand::Argv(argv),
            env: None,
            cwd: None,
        }
    }
}

/// What the JSON accepts wherever a command is expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShellCommandLike {
    Plain(RawCommand),
    Full(ShellCommand),
}

impl ShellCommandLike {
    /// Normalize to a full [`ShellCommand`].
    pub fn to_command(&self) -> ShellCommand {
        match self {
            ShellCommandLike::Plain(raw) => ShellCommand {
                command: raw.clone(),
                env: None,
                cwd: None,
            },
            ShellCommandLike::Full(cmd) => cmd.clone(),
        }
    }

    pub fn display(&self) -> String {
        match self {
            ShellCommandLike::Plain(raw) => raw.display(),
            ShellCommandLike::Full(cmd) => cmd.command.display(),
        }
    }
}

impl From<&str> for ShellCommandLike {
    fn from(line: &str) -> Self {
        ShellCommandLike::Plain(RawCommand::Line(line.to_string()))
    }
}
