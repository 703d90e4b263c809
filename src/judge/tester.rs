//! Run one command against all system cases of a problem

use anyhow::Result;
use chrono::Utc;
use std::io::Write;
use std::time::Duration;
use tracing::{error, info};

use crate::exec;
use crate::models::{JudgeStatus, ResultStatus, ShellCommand, TestcaseResult, VerificationResult};

use super::cache::{SystemTestCase, TestcaseCache};
use super::comparer::OutputComparator;
use super::problem::Problem;

/// Judge-provided checkers only compare two outputs; a minute is ample.
const CHECKER_TIMEOUT: Duration = Duration::from_secs(60);

/// Limits and comparison settings for one problem verification.
#[derive(Debug, Clone)]
pub struct ProblemTest {
    pub command: ShellCommand,
    /// Per-testcase time limit in seconds.
    pub tle: Option<f64>,
    /// Memory limit in megabytes.
    pub mle: Option<f64>,
    /// Numeric tolerance for output comparison.
    pub error: Option<f64>,
}

/// Run every system case and fold the verdicts into one result.
///
/// The file-level status is `Success` iff every case is AC.
pub fn run_problem(
    problem: &dyn Problem,
    cache: &TestcaseCache,
    test: &ProblemTest,
) -> Result<VerificationResult> {
    let cases = problem.system_cases(cache)?;
    let checker = problem.checker_path(cache);
    let comparator = OutputComparator::new(test.error);

    let mut testcases = Vec::with_capacity(cases.len());
    let mut elapsed = 0.0;
    let mut slowest: Option<f64> = None;
    let mut heaviest: Option<f64> = None;

    for case in &cases {
        let result = run_single_case(case, test, checker.as_deref(), comparator);
        info!(
            name = %result.name,
            status = %result.status,
            elapsed = result.elapsed,
            "testcase"
        );
        elapsed += result.elapsed;
        slowest = Some(slowest.map_or(result.elapsed, |s| s.max(result.elapsed)));
        if let Some(memory) = result.memory {
            heaviest = Some(heaviest.map_or(memory, |h| h.max(memory)));
        }
        testcases.push(result);
    }

    let all_accepted = testcases.iter().all(|c| c.status == JudgeStatus::Ac);
    let status = if all_accepted {
        ResultStatus::Success
    } else {
        ResultStatus::Failure
    };
    info!(url = %problem.url(), %status, cases = testcases.len(), "problem finished");

    Ok(VerificationResult {
        verification_name: None,
        status,
        elapsed,
        slowest,
        heaviest,
        testcases: Some(testcases),
        last_execution_time: Utc::now(),
    })
}

fn run_single_case(
    case: &SystemTestCase,
    test: &ProblemTest,
    checker: Option<&std::path::Path>,
    comparator: OutputComparator,
) -> TestcaseResult {
    let run = match exec::measure(&test.command, &case.input_path, test.tle) {
        Ok(run) => run,
        Err(err) => {
            error!(name = %case.name, %err, "failed to execute testcase");
            return TestcaseResult {
                name: case.name.clone(),
                status: JudgeStatus::Re,
                elapsed: 0.0,
                memory: None,
            };
        }
    };

    let status = classify(case, test, checker, comparator, &run);
    TestcaseResult {
        name: case.name.clone(),
        status,
        elapsed: run.elapsed,
        memory: run.memory_mb,
    }
}

/// TLE and MLE take precedence over RE, which takes precedence over WA.
fn classify(
    case: &SystemTestCase,
    test: &ProblemTest,
    checker: Option<&std::path::Path>,
    comparator: OutputComparator,
    run: &exec::MeasuredRun,
) -> JudgeStatus {
    if run.timed_out {
        return JudgeStatus::Tle;
    }
    if let (Some(memory), Some(mle)) = (run.memory_mb, test.mle) {
        if memory > mle {
            return JudgeStatus::Mle;
        }
    }
    if run.exit_code != Some(0) {
        return JudgeStatus::Re;
    }

    let matched = match checker {
        Some(checker) => run_checker(checker, case, &run.stdout),
        None => match &case.output_path {
            Some(expected_path) => {
                let expected = std::fs::read(expected_path).unwrap_or_default();
                Some(comparator.matches(&run.stdout, &expected))
            }
            // No expected output and no checker: nothing to compare.
            None => None,
        },
    };
    match matched {
        Some(false) => JudgeStatus::Wa,
        _ => JudgeStatus::Ac,
    }
}

/// Run a judge-provided checker: `checker <input> <actual> <expected>`,
/// accepted iff it exits zero.
fn run_checker(
    checker: &std::path::Path,
    case: &SystemTestCase,
    actual: &[u8],
) -> Option<bool> {
    let actual_file = match write_actual(actual) {
        Ok(file) => file,
        Err(err) => {
            error!(%err, "failed to stage checker input");
            return Some(false);
        }
    };

    let mut argv = vec![
        checker.to_string_lossy().into_owned(),
        case.input_path.to_string_lossy().into_owned(),
        actual_file.path().to_string_lossy().into_owned(),
    ];
    if let Some(expected) = &case.output_path {
        argv.push(expected.to_string_lossy().into_owned());
    }

    match exec::run_captured(&ShellCommand::argv(argv), None, Some(CHECKER_TIMEOUT)) {
        Ok(result) => Some(result.exit_code == Some(0)),
        Err(err) => {
            error!(%err, "checker execution failed");
            Some(false)
        }
    }
}

fn write_actual(actual: &[u8]) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(actual)?;
    file.flush()?;
    Ok(file)
}
