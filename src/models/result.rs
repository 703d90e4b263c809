//! Verification results and their merge algebra

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::file::normalize_path;
use super::status::{JudgeStatus, ResultStatus};

/// Outcome of one system test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestcaseResult {
    pub name: String,
    pub status: JudgeStatus,
    /// Seconds elapsed for this case.
    pub elapsed: f64,
    /// Peak memory in megabytes, when the platform reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<f64>,
}

/// Outcome of running one verification directive once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_name: Option<String>,

    pub status: ResultStatus,

    /// Total seconds elapsed across all test cases.
    pub elapsed: f64,

    /// Maximum seconds elapsed for a single test case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slowest: Option<f64>,

    /// Maximum memory used by a single test case, in megabytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heaviest: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testcases: Option<Vec<TestcaseResult>>,

    /// When the directive was run (or would have been, for const/skip).
    pub last_execution_time: DateTime<Utc>,
}

impl VerificationResult {
    /// A non-success result is never trusted as stable; a success goes
    /// stale once a transitive dependency is newer than this run.
    pub fn need_reverifying(&self, base_time: DateTime<Utc>) -> bool {
        if self.status != ResultStatus::Success {
            return true;
        }
        self.last_execution_time < base_time
    }
}

/// All verification results for one file in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    #[serde(default)]
    pub verifications: Vec<VerificationResult>,

    /// Whether this entry belongs to the current run (`true`) or was
    /// carried over from a previous result file (`false`).
    #[serde(default = "default_newest")]
    pub newest: bool,
}

fn default_newest() -> bool {
    true
}

impl FileResult {
    pub fn new(verifications: Vec<VerificationResult>) -> Self {
        FileResult {
            verifications,
            newest: true,
        }
    }

    /// Aggregate status: the worst of the individual verdicts.
    pub fn status(&self) -> ResultStatus {
        self.verifications
            .iter()
            .map(|v| v.status)
            .max()
            .unwrap_or(ResultStatus::Success)
    }

    /// Whether any directive must be re-run given the file's effective
    /// modification time.
    pub fn need_verification(&self, base_time: DateTime<Utc>) -> bool {
        if self.verifications.is_empty() {
            return true;
        }
        self.verifications
            .iter()
            .any(|v| v.need_reverifying(base_time))
    }

    pub fn is_success(&self, allow_skip: bool) -> bool {
        if allow_skip {
            self.verifications
                .iter()
                .all(|v| v.status != ResultStatus::Failure)
        } else {
            self.verifications
                .iter()
                .all(|v| v.status == ResultStatus::Success)
        }
    }
}

/// Top-level result of one `verify` run (or a merge of several).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyCommandResult {
    /// Total seconds elapsed; additive under merge.
    pub total_seconds: f64,

    #[serde(default)]
    pub files: BTreeMap<PathBuf, FileResult>,
}

impl VerifyCommandResult {
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read result file: {}", path.display()))?;
        let raw: VerifyCommandResult = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse result file: {}", path.display()))?;

        let mut files = BTreeMap::new();
        for (file_path, r) in raw.files {
            if let Some(p) = normalize_path(&file_path) {
                files.insert(p, r);
            }
        }
        Ok(VerifyCommandResult {
            total_seconds: raw.total_seconds,
            files,
        })
    }

    pub fn save_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self).context("Failed to serialize result")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write result file: {}", path.display()))?;
        Ok(())
    }

    /// Merge two results.
    ///
    /// `total_seconds` adds; per file the right operand wins, except that a
    /// carried-over (`newest == false`) entry never displaces a fresh one.
    pub fn merge(mut self, other: VerifyCommandResult) -> VerifyCommandResult {
        for (path, result) in other.files {
            match self.files.get(&path) {
                Some(current) if !result.newest && current.newest => {}
                _ => {
                    self.files.insert(path, result);
                }
            }
        }
        VerifyCommandResult {
            total_seconds: self.total_seconds + other.total_seconds,
            files: self.files,
        }
    }

    /// Count every individual verification result by status.
    pub fn status_counts(&self) -> BTreeMap<ResultStatus, usize> {
        let mut counts = BTreeMap::new();
        for file in self.files.values() {
            for v in &file.verifications {
                *counts.entry(v.status).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn is_success(&self, allow_skip: bool) -> bool {
        self.files.values().all(|f| f.is_success(allow_skip))
    }
}
