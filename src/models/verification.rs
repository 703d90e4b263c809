//! Verification directives attached to source files
//!
//! A directive is a tagged union keyed by a `type` field in the JSON:
//! `"const"` (fixed outcome), `"command"` (arbitrary shell command) or
//! `"problem"` (run against an online-judge problem's system cases).

use serde::{Deserialize, Serialize};

use super::shell::ShellCommandLike;
use super::status::ResultStatus;

/// One executable check attached to a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Verification {
    /// Always yields a fixed status without executing anything.
    ///
    /// Used for ignore flags and environment-variable shortcuts produced
    /// by the scanners.
    Const {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        status: ResultStatus,
    },

    /// Run a shell command; success iff the exit code is zero.
    Command {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        command: ShellCommandLike,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        compile: Option<ShellCommandLike>,
        /// Run the command inside a fresh temporary directory.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tempdir: Option<bool>,
    },

    /// Run a command against every system test case of a judge problem.
    Problem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        command: ShellCommandLike,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        compile: Option<ShellCommandLike>,
        /// The URL of the problem.
        problem: String,
        /// Absolute/relative error tolerance for output comparison.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<f64>,
        /// Per-testcase time limit in seconds; falls back to the run default.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tle: Option<f64>,
        /// Memory limit in megabytes; falls back to the run default.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mle: Option<f64>,
    },
}

impl Verification {
    pub fn name(&self) -> Option<&str> {
        match self {
            Verification::Const { name, .. }
            | Verification::Command { name, .. }
            | Verification::Problem { name, .. } => name.as_deref(),
        }
    }

    /// A directive is skippable when it resolves to a constant outcome
    /// without running anything.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Verification::Const { .. })
    }

    /// The compile command, if any.
    pub fn compile(&self) -> Option<&ShellCommandLike> {
        match self {
            Verification::Const { .. } => None,
            Verification::Command { compile, .. } | Verification::Problem { compile, .. } => {
                compile.as_ref()
            }
        }
    }

    /// The problem URL for `Problem` directives.
    pub fn problem_url(&self) -> Option<&str> {
        match self {
            Verification::Problem { problem, .. } => Some(problem),
            _ => None,
        }
    }
}
