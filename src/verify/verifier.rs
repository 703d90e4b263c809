//! Work selection and batch execution
//!
//! The verifier decides which files still need verification (staleness
//! against their transitive dependencies plus a previous result) and runs
//! the survivors' directives under a shared wall-clock budget. Every
//! per-directive failure becomes a `FAILURE` result; only structural
//! errors (unreadable input, bad arguments) propagate.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::exec;
use crate::graph::DependencyGraph;
use crate::judge::problem::ProblemError;
use crate::judge::{self, problem_from_url, ProblemTest, TestcaseCache};
use crate::models::{
    FileResult, ResultStatus, ShellCommand, Verification, VerificationFile, VerificationInput,
    VerificationResult, VerifyCommandResult,
};
use crate::timestamp::TimestampSource;

use super::split_state::SplitState;

/// Knobs for one `verify` run.
pub struct VerifyOptions {
    /// Result of an earlier run; files it proved fresh are not re-run.
    pub prev_result: Option<VerifyCommandResult>,
    pub split_state: Option<SplitState>,
    /// Shared wall-clock budget in seconds for the whole batch.
    pub timeout: Option<f64>,
    /// Per-testcase time limit when a directive names none.
    pub default_tle: f64,
    /// Memory limit in megabytes when a directive names none.
    pub default_mle: Option<f64>,
    /// Fetch missing problem test cases before running.
    pub download: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        VerifyOptions {
            prev_result: None,
            split_state: None,
            timeout: None,
            default_tle: 60.0,
            default_mle: None,
            download: true,
        }
    }
}

pub struct Verifier {
    input: VerificationInput,
    graph: DependencyGraph,
    timestamps: Box<dyn TimestampSource>,
    cache: TestcaseCache,
    options: VerifyOptions,
    /// Start of the run; timestamps are clamped to it so future-dated
    /// files (clock skew) cannot stay permanently stale.
    verification_time: DateTime<Utc>,
}

impl Verifier {
    pub fn new(
        input: VerificationInput,
        timestamps: Box<dyn TimestampSource>,
        cache: TestcaseCache,
        options: VerifyOptions,
    ) -> Self {
        let graph = DependencyGraph::new(input.dependency_edges());
        Verifier {
            input,
            graph,
            timestamps,
            cache,
            options,
            verification_time: Utc::now(),
        }
    }

    /// Effective modification time of `path`: the newest change among its
    /// transitive dependencies, clamped to the run start.
    pub fn effective_timestamp(&self, path: &Path) -> Result<DateTime<Utc>> {
        let closure = self.graph.transitive_depends_on(path);
        let stamp = self.timestamps.timestamp(&closure)?;
        Ok(stamp.min(self.verification_time))
    }

    /// Files carrying at least one directive and still present on disk.
    /// Deleted files drop out silently.
    pub fn verification_files(&self) -> BTreeMap<&Path, &VerificationFile> {
        self.input
            .files
            .iter()
            .filter(|(p, f)| f.is_verification() && p.exists())
            .map(|(p, f)| (p.as_path(), f))
            .collect()
    }

    /// The all-const files, run on the first shard only.
    pub fn skippable_verification_files(&self) -> Vec<(&Path, &VerificationFile)> {
        self.verification_files()
            .into_iter()
            .filter(|(_, f)| f.is_skippable_verification())
            .collect()
    }

    /// Non-skippable files that still need to run, given the previous
    /// result and each file's effective timestamp.
    pub fn remaining_verification_files(&self) -> Result<Vec<(&Path, &VerificationFile)>> {
        let mut remaining = Vec::new();
        for (path, file) in self.verification_files() {
            if file.is_skippable_verification() {
                continue;
            }
            let fresh = match self.options.prev_result.as_ref().and_then(|r| r.files.get(path)) {
                Some(prev) => !prev.need_verification(self.effective_timestamp(path)?),
                None => false,
            };
            if fresh {
                debug!(path = %path.display(), "up to date, skipping");
            } else {
                remaining.push((path, file));
            }
        }
        Ok(remaining)
    }

    /// This shard's slice of the pending files, in path order.
    pub fn current_verification_files(&self) -> Result<Vec<(&Path, &VerificationFile)>> {
        // BTreeMap iteration already sorted by path; shards must agree on
        // the order without communicating.
        let remaining = self.remaining_verification_files()?;
        Ok(match self.options.split_state {
            Some(split) => split.split(&remaining).to_vec(),
            None => remaining,
        })
    }

    /// Run the batch and produce a result that always includes an entry
    /// for every file this shard touched, plus carried-over entries for
    /// files proven fresh.
    pub fn verify(&self) -> Result<VerifyCommandResult> {
        let start = Instant::now();
        // Duration::from_secs_f64 panics on negative or non-finite input.
        let deadline = match self.options.timeout {
            Some(t) if !t.is_finite() || t < 0.0 => {
                bail!("invalid timeout: {t} (must be a non-negative number of seconds)")
            }
            Some(t) => Some(start + std::time::Duration::from_secs_f64(t)),
            None => None,
        };

        let current = self.current_verification_files()?;
        let split = self
            .options
            .split_state
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".into());
        info!(files = current.len(), split = %split, "starting verification");

        let mut files: BTreeMap<PathBuf, FileResult> = BTreeMap::new();

        // Entries from the previous run are carried over (marked stale) so
        // a shard's output is self-contained; merge drops them whenever a
        // fresh entry for the same path exists.
        if let Some(prev) = &self.options.prev_result {
            for (path, file_result) in &prev.files {
                if self.input.files.contains_key(path) && path.exists() {
                    let mut carried = file_result.clone();
                    carried.newest = false;
                    files.insert(path.clone(), carried);
                }
            }
        }

        if self.on_first_shard() {
            for (path, file) in self.skippable_verification_files() {
                files.insert(path.to_path_buf(), self.run_file(path, file, deadline));
            }
        }

        for (path, file) in current {
            files.insert(path.to_path_buf(), self.run_file(path, file, deadline));
        }

        Ok(VerifyCommandResult {
            total_seconds: start.elapsed().as_secs_f64(),
            files,
        })
    }

    fn on_first_shard(&self) -> bool {
        self.options.split_state.map_or(true, |s| s.index == 0)
    }

    /// Run all directives of one file. Never fails: every error becomes a
    /// `FAILURE` entry.
    fn run_file(&self, path: &Path, file: &VerificationFile, deadline: Option<Instant>) -> FileResult {
        info!(path = %path.display(), "verifying");

        if let Err(err) = self.download_for_file(file) {
            error!(path = %path.display(), %err, "failed to prepare test cases");
            return FileResult::new(vec![failure_result(None)]);
        }

        let mut results = Vec::with_capacity(file.verification.len());
        for directive in &file.verification {
            let name = directive.name().map(str::to_owned);
            if deadline.is_some_and(|d| Instant::now() >= d) {
                // Budget exhaustion is not an error; the skip is recorded
                // and the next run retries.
                warn!(path = %path.display(), "batch timeout reached, skipping");
                results.push(VerificationResult {
                    verification_name: name,
                    status: ResultStatus::Skipped,
                    elapsed: 0.0,
                    slowest: None,
                    heaviest: None,
                    testcases: None,
                    last_execution_time: Utc::now(),
                });
                continue;
            }

            let result = match self.run_directive(directive) {
                Ok(result) => result,
                Err(err) => {
                    error!(path = %path.display(), %err, "verification errored");
                    failure_result(name.clone())
                }
            };
            results.push(VerificationResult {
                verification_name: name,
                ..result
            });
        }
        FileResult::new(results)
    }

    /// Fetch test cases for every problem directive of a file up front, so
    /// a dead judge fails the file once instead of once per directive.
    fn download_for_file(&self, file: &VerificationFile) -> Result<()> {
        if !self.options.download {
            return Ok(());
        }
        for directive in &file.verification {
            if let Some(url) = directive.problem_url() {
                let problem = problem_from_url(url)
                    .ok_or_else(|| ProblemError::UnsupportedUrl(url.to_string()))?;
                problem.download_system_cases(&self.cache)?;
            }
        }
        Ok(())
    }

    fn run_directive(&self, directive: &Verification) -> Result<VerificationResult> {
        let start = Instant::now();
        match directive {
            Verification::Const { status, .. } => Ok(VerificationResult {
                verification_name: None,
                status: *status,
                elapsed: start.elapsed().as_secs_f64(),
                slowest: None,
                heaviest: None,
                testcases: None,
                last_execution_time: Utc::now(),
            }),

            Verification::Command {
                command,
                compile,
                tempdir,
                ..
            } => {
                if let Some(failed) = self.run_compile(compile.as_ref().map(|c| c.to_command()))? {
                    return Ok(failed);
                }
                let mut command = command.to_command();
                // Keep the tempdir alive until the command finishes.
                let scratch = match tempdir {
                    Some(true) if command.cwd.is_none() => {
                        let dir = tempfile::tempdir().context("Failed to create tempdir")?;
                        command.cwd = Some(dir.path().to_path_buf());
                        Some(dir)
                    }
                    _ => None,
                };
                let status = exec::run_status(&command)?;
                drop(scratch);
                Ok(VerificationResult {
                    verification_name: None,
                    status: if status.success() {
                        ResultStatus::Success
                    } else {
                        ResultStatus::Failure
                    },
                    elapsed: start.elapsed().as_secs_f64(),
                    slowest: None,
                    heaviest: None,
                    testcases: None,
                    last_execution_time: Utc::now(),
                })
            }

            Verification::Problem {
                command,
                compile,
                problem,
                error,
                tle,
                mle,
                ..
            } => {
                if let Some(failed) = self.run_compile(compile.as_ref().map(|c| c.to_command()))? {
                    return Ok(failed);
                }
                let resolved = problem_from_url(problem)
                    .ok_or_else(|| ProblemError::UnsupportedUrl(problem.clone()))?;
                let test = ProblemTest {
                    command: command.to_command(),
                    tle: Some(tle.unwrap_or(self.options.default_tle)),
                    mle: mle.or(self.options.default_mle),
                    error: *error,
                };
                judge::run_problem(resolved.as_ref(), &self.cache, &test)
            }
        }
    }

    /// Run an optional compile step; a nonzero exit yields the `FAILURE`
    /// result to record instead of executing.
    fn run_compile(&self, compile: Option<ShellCommand>) -> Result<Option<VerificationResult>> {
        let Some(compile) = compile else {
            return Ok(None);
        };
        let start = Instant::now();
        let status = exec::run_status(&compile)?;
        if status.success() {
            return Ok(None);
        }
        error!(command = %compile.command.display(), "compile failed");
        Ok(Some(VerificationResult {
            verification_name: None,
            status: ResultStatus::Failure,
            elapsed: start.elapsed().as_secs_f64(),
            slowest: None,
            heaviest: None,
            testcases: None,
            last_execution_time: Utc::now(),
        }))
    }
}

fn failure_result(name: Option<String>) -> VerificationResult {
    VerificationResult {
        verification_name: name,
        status: ResultStatus::Failure,
        elapsed: 0.0,
        slowest: None,
        heaviest: None,
        testcases: None,
        last_execution_time: Utc::now(),
    }
}
